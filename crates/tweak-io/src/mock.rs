//! Deterministic backend for tests.
//!
//! [`MockBackend`] never touches hardware. It stores the output callback of
//! the stream it opened; tests pull audio with [`MockBackend::pull`] and
//! inject failures with [`MockBackend::raise_error`]. Clones share state, so a
//! test keeps one handle and gives the other to a session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backend::{AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle};
use crate::{AudioDevice, Error, Result};

#[derive(Default)]
struct MockState {
    callback: Option<OutputCallback>,
    error_callback: Option<ErrorCallback>,
    config: Option<BackendStreamConfig>,
    streams_opened: usize,
    active_stream: u64,
    fail_next: Option<String>,
}

/// A backend whose stream is driven by the test.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Creates a backend with no open stream.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs the output callback for `frames` frames and returns the
    /// interleaved samples. Silence when no stream is open.
    pub fn pull(&self, frames: usize) -> Vec<f32> {
        let mut state = self.lock();
        let channels = state
            .config
            .as_ref()
            .map_or(1, |c| usize::from(c.channels));
        let mut data = vec![0.0; frames * channels];
        if let Some(callback) = state.callback.as_mut() {
            callback(&mut data);
        }
        data
    }

    /// Reports a stream failure through the error callback.
    pub fn raise_error(&self, message: &str) {
        if let Some(callback) = self.lock().error_callback.as_mut() {
            callback(message);
        }
    }

    /// Makes the next `build_output_stream` fail with [`Error::Device`].
    pub fn fail_next_open(&self, message: &str) {
        self.lock().fail_next = Some(message.to_owned());
    }

    /// Number of streams opened so far.
    pub fn streams_opened(&self) -> usize {
        self.lock().streams_opened
    }

    /// Configuration of the most recently opened stream.
    pub fn last_config(&self) -> Option<BackendStreamConfig> {
        self.lock().config.clone()
    }

    /// True while a stream handle is alive.
    pub fn is_active(&self) -> bool {
        self.lock().callback.is_some()
    }
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MockBackend")
            .field("streams_opened", &state.streams_opened)
            .field("active", &state.callback.is_some())
            .finish()
    }
}

/// Clears the callbacks when its handle drops, unless a newer stream replaced them.
struct MockStream {
    id: u64,
    state: Arc<Mutex<MockState>>,
}

impl Drop for MockStream {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.active_stream == self.id {
            state.callback = None;
            state.error_callback = None;
        }
    }
}

impl AudioBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        Ok(self.default_output_device()?.into_iter().collect())
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        Ok(Some(AudioDevice {
            index: 0,
            name: "Mock Output".into(),
            is_default: true,
            default_sample_rate: 48000,
            default_channels: 2,
        }))
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let mut state = self.lock();
        if let Some(message) = state.fail_next.take() {
            return Err(Error::Device(message));
        }
        state.streams_opened += 1;
        state.active_stream += 1;
        state.callback = Some(callback);
        state.error_callback = Some(error_callback);
        state.config = Some(config.clone());
        Ok(StreamHandle::new(MockStream {
            id: state.active_stream,
            state: Arc::clone(&self.state),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_runs_callback() {
        let backend = MockBackend::new();
        let config = BackendStreamConfig {
            channels: 1,
            ..BackendStreamConfig::default()
        };
        let handle = backend
            .build_output_stream(
                &config,
                Box::new(|data: &mut [f32]| data.fill(0.25)),
                Box::new(|_: &str| {}),
            )
            .unwrap();
        assert_eq!(backend.pull(3), vec![0.25; 3]);
        assert!(backend.is_active());
        drop(handle);
        assert!(!backend.is_active());
        assert_eq!(backend.pull(2), vec![0.0; 2]);
    }

    #[test]
    fn stale_handle_does_not_clear_newer_stream() {
        let backend = MockBackend::new();
        let config = BackendStreamConfig::default();
        let first = backend
            .build_output_stream(&config, Box::new(|_: &mut [f32]| {}), Box::new(|_: &str| {}))
            .unwrap();
        let _second = backend
            .build_output_stream(&config, Box::new(|_: &mut [f32]| {}), Box::new(|_: &str| {}))
            .unwrap();
        drop(first);
        assert!(backend.is_active());
        assert_eq!(backend.streams_opened(), 2);
    }
}
