//! Pluggable audio output abstraction.
//!
//! [`AudioBackend`] decouples the live session from any particular platform
//! audio API. [`CpalBackend`](crate::CpalBackend) is the real implementation;
//! [`MockBackend`](crate::MockBackend) drives the callback by hand so session
//! behaviour can be tested without a sound card.
//!
//! ```text
//! LiveSession ──uses──▶ AudioBackend ──▶ CpalBackend (ALSA, CoreAudio, WASAPI)
//!                                   └──▶ MockBackend (tests)
//! ```
//!
//! Callbacks are boxed closures, so the trait stays object-safe. Streams come
//! back as a type-erased [`StreamHandle`] that stops output when dropped.

use crate::{AudioDevice, Result};

/// Configuration for building an output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames. `None` lets the device decide.
    pub buffer_size: Option<u32>,
    /// Number of interleaved output channels.
    pub channels: u16,
    /// Device name, index or name fragment. `None` uses the system default.
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: None,
            channels: 2,
            device_name: None,
        }
    }
}

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops output.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wraps a backend-specific stream object, keeping it alive until drop.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Audio output callback.
///
/// Runs on the real-time audio thread and fills a buffer of interleaved f32
/// samples (`[L0, R0, L1, R1, ...]` for stereo). It must not block, lock
/// contended mutexes, allocate or perform I/O.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Error callback, called with a human-readable message when the stream fails.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Pluggable audio output backend.
pub trait AudioBackend: Send {
    /// Human-readable backend name (e.g. "cpal", "mock").
    fn name(&self) -> &str;

    /// Lists the output devices this backend can open.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// The system default output device, if any.
    fn default_output_device(&self) -> Result<Option<AudioDevice>>;

    /// Builds and starts an output stream.
    ///
    /// `callback` is invoked on the audio thread for every device buffer.
    /// `error_callback` is invoked when the stream fails after it started.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = BackendStreamConfig::default();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, None);
        assert_eq!(config.channels, 2);
        assert!(config.device_name.is_none());
    }

    #[test]
    fn stream_handle_debug() {
        let handle = StreamHandle::new(42u32);
        assert!(format!("{handle:?}").contains("StreamHandle"));
    }
}
