//! Audio I/O layer for tweak.
//!
//! This crate provides:
//!
//! - **WAV codec**: [`encode`] / [`decode`] for in-memory bytes, [`read_wav`] and
//!   [`write_wav`] for files
//! - **Device access**: the [`AudioBackend`] trait, its cpal implementation
//!   [`CpalBackend`], and device listing
//! - **Live playback**: [`LiveSession`], a play/pause/seek state machine that
//!   hands compiled effect graphs to the audio callback
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tweak_core::{EffectParameters, render_with_params};
//! use tweak_io::{WavFormat, read_wav, write_wav};
//!
//! let input = Arc::new(read_wav("input.wav")?);
//! let params = EffectParameters::default().with_reverb(0.3).with_pitch(-2.0);
//! let output = render_with_params(&input, &params)?;
//! write_wav("output.wav", &output, WavFormat::Pcm16)?;
//! # Ok::<(), tweak_io::Error>(())
//! ```

pub mod backend;
pub mod clock;
pub mod cpal_backend;
mod devices;
pub mod mock;
mod playback;
pub mod session;
mod wav;

pub use backend::{AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use cpal_backend::CpalBackend;
pub use devices::{AudioDevice, default_output_device, find_output_device, list_devices};
pub use mock::MockBackend;
pub use session::{LiveSession, PlaybackState, SessionConfig, SessionEvent};
pub use wav::{
    SampleEncoding, WavFormat, WavInfo, decode, encode, encode_with, read_wav, read_wav_info,
    write_wav,
};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV encode/decode error.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio device or stream failure.
    #[error("Audio device error: {0}")]
    Device(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input, graph or render failure from the core.
    #[error(transparent)]
    Core(#[from] tweak_core::Error),
}

impl Error {
    /// True when the root cause is an invalid buffer, offset or parameter.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::Core(e) if e.is_invalid_input())
    }
}

/// Result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
