//! Tweak Core - effect graphs for decoded audio
//!
//! This crate turns a decoded [`AudioBuffer`] and a set of [`EffectParameters`]
//! into a small directed audio graph and runs it, either block by block from a
//! real-time callback or all at once as an offline render.
//!
//! # Core Abstractions
//!
//! ## Data
//!
//! - [`AudioBuffer`] - Planar f32 audio with a sample rate, shared as `Arc`
//! - [`EffectParameters`] - Pitch, reverb, volume and speed, with domains
//! - [`ImpulseResponse`] - Synthetic decaying-noise reverb impulse
//!
//! ## Stages
//!
//! Each [`Stage`] attaches itself to a graph under construction:
//!
//! - [`SpeedStage`] - Sets the source playback rate
//! - [`PitchStage`] - Detunes the source by `100 * semitones` cents
//! - [`ReverbStage`] - Dry path plus convolved wet path, summed
//! - [`GainStage`] - Scalar output gain
//!
//! ## Graph
//!
//! - [`build`] - Source node plus stages in canonical order
//! - [`graph::AudioGraph`] - Arena DAG with cycle detection
//! - [`graph::CompiledGraph`] - Allocation-free block executor
//!
//! ## Rendering
//!
//! - [`render`] / [`OfflineRenderer`] - Whole-buffer, non-real-time processing
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tweak_core::{AudioBuffer, EffectParameters, render};
//!
//! let input = Arc::new(AudioBuffer::mono(vec![0.1; 4800], 48000)?);
//! let params = EffectParameters::default().with_volume(2.0).with_pitch(12.0);
//! params.validate()?;
//!
//! let output = render(&input, &params.stages())?;
//! assert_eq!(output.frame_count(), 2400);
//! # Ok::<(), tweak_core::Error>(())
//! ```
//!
//! # Features
//!
//! - `tracing` - Debug-level logs for graph construction and rendering
//! - `serde` - `Serialize`/`Deserialize` for [`EffectParameters`]

pub mod buffer;
pub mod builder;
pub mod error;
pub mod graph;
pub mod impulse;
pub mod params;
pub mod render;
pub mod stage;

pub use buffer::{AudioBuffer, MAX_CHANNELS};
pub use builder::{BuiltGraph, MAX_OUTPUT_SECONDS, build, check_output_length};
pub use error::{Error, Result};
pub use graph::{CompiledGraph, GraphError};
pub use impulse::{ImpulseResponse, synthesize, synthesize_with_rng};
pub use params::{EffectParameters, PITCH_RANGE, REVERB_RANGE, SPEED_RANGE, VOLUME_RANGE};
pub use render::{DEFAULT_BLOCK_SIZE, OfflineRenderer, render, render_with_params};
pub use stage::{
    GainStage, PitchStage, ReverbStage, SourceChange, SpeedStage, Stage, StageKind, StageList,
};
