//! Presets for tweak.
//!
//! A [`Preset`] is a named set of [`EffectParameters`](tweak_core::EffectParameters)
//! with optional render settings, stored as TOML.
//!
//! - **Presets**: [`Preset::load`], [`Preset::save`], [`Preset::from_toml`], [`Preset::to_toml`]
//! - **Factory presets**: built in, always available ([`factory_presets`])
//! - **Paths**: user and system preset directories ([`paths`])
//!
//! # Example
//!
//! ```rust,no_run
//! use tweak_config::{Preset, user_presets_dir};
//! use tweak_core::EffectParameters;
//!
//! let preset = Preset::new("Late Night")
//!     .with_description("Dark and roomy")
//!     .with_effects(EffectParameters::default().with_pitch(-2.0).with_reverb(0.5));
//!
//! preset.save(user_presets_dir().join("late_night.toml"))?;
//! let loaded = Preset::resolve("late_night")?;
//! assert_eq!(loaded, preset);
//! # Ok::<(), tweak_config::ConfigError>(())
//! ```

mod error;
mod preset;

/// Platform-specific preset directories.
pub mod paths;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_presets, get_factory_preset, is_factory_preset,
};
pub use paths::{
    ensure_user_presets_dir, find_preset, list_all_presets, preset_name_from_path,
    system_presets_dir, user_config_dir, user_presets_dir,
};
pub use preset::{Preset, RenderSettings};
