//! Preset file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use tweak_core::EffectParameters;

use crate::error::ConfigError;

/// Named effect parameters plus optional render settings.
///
/// Presets are stored as TOML files. Every field except `name` may be left
/// out; missing effect parameters fall back to their neutral defaults.
///
/// # TOML Format
///
/// ```toml
/// name = "Slowed + Reverb"
/// description = "Slower, lower, washed out"
///
/// [effects]
/// pitch_semitones = 0.0
/// reverb_amount = 0.4
/// volume = 1.0
/// speed = 0.85
///
/// [render]
/// bit_depth = 24
/// seed = 7
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Effect parameters.
    #[serde(default)]
    pub effects: EffectParameters,

    /// Offline render settings.
    #[serde(default, skip_serializing_if = "RenderSettings::is_empty")]
    pub render: RenderSettings,
}

/// Optional overrides for offline rendering.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderSettings {
    /// Output bit depth: 16, 24 or 32 (float).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_depth: Option<u16>,

    /// Processing block size in frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_size: Option<usize>,

    /// Seed for the reverb impulse, for reproducible renders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl RenderSettings {
    /// True when no setting is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Preset {
    /// Create a preset with neutral parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            effects: EffectParameters::default(),
            render: RenderSettings::default(),
        }
    }

    /// Create a preset with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the effect parameters.
    pub fn with_effects(mut self, effects: EffectParameters) -> Self {
        self.effects = effects;
        self
    }

    /// Set the render settings.
    pub fn with_render(mut self, render: RenderSettings) -> Self {
        self.render = render;
        self
    }

    /// Checks the effect parameters and render settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.effects.validate()?;
        if let Some(bits) = self.render.bit_depth
            && !matches!(bits, 16 | 24 | 32)
        {
            return Err(ConfigError::InvalidSetting {
                setting: "bit_depth",
                reason: format!("{bits} is not one of 16, 24 or 32"),
            });
        }
        if self.render.block_size == Some(0) {
            return Err(ConfigError::InvalidSetting {
                setting: "block_size",
                reason: "must be at least one frame".into(),
            });
        }
        Ok(())
    }

    /// Load and validate a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a preset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let preset: Preset = toml::from_str(toml_str)?;
        preset.validate()?;
        Ok(preset)
    }

    /// Save the preset to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Looks a preset up by factory name, file path, or name in the preset
    /// directories, in that order.
    pub fn resolve(name: &str) -> Result<Self, ConfigError> {
        if let Some(preset) = crate::get_factory_preset(name) {
            return Ok(preset);
        }
        match crate::find_preset(name) {
            Some(path) => Self::load(path),
            None => Err(ConfigError::PresetNotFound(name.to_string())),
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_new() {
        let preset = Preset::new("Test Preset");
        assert_eq!(preset.name, "Test Preset");
        assert!(preset.description.is_none());
        assert_eq!(preset.effects, EffectParameters::default());
        assert!(preset.render.is_empty());
    }

    #[test]
    fn test_preset_from_toml() {
        let toml = r#"
name = "Test"
description = "A test preset"

[effects]
pitch_semitones = -3.0
reverb_amount = 0.5

[render]
bit_depth = 24
seed = 9
"#;

        let preset = Preset::from_toml(toml).unwrap();
        assert_eq!(preset.name, "Test");
        assert_eq!(preset.description.as_deref(), Some("A test preset"));
        assert_eq!(preset.effects.pitch_semitones, -3.0);
        assert_eq!(preset.effects.reverb_amount, 0.5);
        // Omitted fields keep their defaults.
        assert_eq!(preset.effects.volume, 1.0);
        assert_eq!(preset.effects.speed, 1.0);
        assert_eq!(preset.render.bit_depth, Some(24));
        assert_eq!(preset.render.block_size, None);
        assert_eq!(preset.render.seed, Some(9));
    }

    #[test]
    fn test_minimal_toml() {
        let preset = Preset::from_toml("name = \"Minimal\"").unwrap();
        assert_eq!(preset.name, "Minimal");
        assert_eq!(preset.effects, EffectParameters::default());
    }

    #[test]
    fn test_preset_to_toml() {
        let preset = Preset::new("Test")
            .with_description("Test description")
            .with_effects(EffectParameters::default().with_volume(2.0));

        let toml = preset.to_toml().unwrap();
        assert!(toml.contains("name = \"Test\""));
        assert!(toml.contains("description = \"Test description\""));
        assert!(toml.contains("volume = 2.0"));
        assert!(!toml.contains("[render]"));
    }

    #[test]
    fn test_preset_roundtrip() {
        let original = Preset::new("Roundtrip")
            .with_effects(
                EffectParameters::default()
                    .with_pitch(4.0)
                    .with_reverb(0.25)
                    .with_speed(1.5),
            )
            .with_render(RenderSettings {
                bit_depth: Some(32),
                block_size: Some(256),
                seed: Some(1),
            });

        let parsed = Preset::from_toml(&original.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_out_of_domain_rejected() {
        let toml = "name = \"Loud\"\n[effects]\nvolume = 9.0\n";
        assert!(matches!(
            Preset::from_toml(toml),
            Err(ConfigError::InvalidParameters(_))
        ));

        let toml = "name = \"Odd\"\n[render]\nbit_depth = 12\n";
        assert!(matches!(
            Preset::from_toml(toml),
            Err(ConfigError::InvalidSetting { setting: "bit_depth", .. })
        ));

        let toml = "name = \"Zero\"\n[render]\nblock_size = 0\n";
        assert!(Preset::from_toml(toml).is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            Preset::from_toml("name = "),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_resolve_factory_first() {
        let preset = Preset::resolve("hall").unwrap();
        assert_eq!(preset.name, "Hall");
        assert!(matches!(
            Preset::resolve("no_such_preset_4821"),
            Err(ConfigError::PresetNotFound(_))
        ));
    }
}
