//! Live playback sessions.
//!
//! A [`LiveSession`] plays one [`AudioBuffer`] through the effect graph for its
//! current [`EffectParameters`]. It is a small state machine:
//!
//! ```text
//!            play / resume            pause
//!   Idle ───────────────────▶ Playing ──────▶ Paused
//!    ▲                         │  ▲             │
//!    │ end of buffer, stop,    │  └─────────────┘
//!    │ device error            │      resume
//!    └─────────────────────────┘
//! ```
//!
//! Every `play` builds and compiles a fresh graph on the calling thread and
//! sends it to the audio callback, which swaps it in at the start of its next
//! buffer. Parameter changes while playing rebuild at the current position,
//! so the reverb tail and any filter state reset at that instant.
//!
//! Elapsed time is read from a [`Clock`] on demand: `now - start_epoch`, where
//! `start_epoch` is the clock reading at which position zero would have
//! played. It is wall-clock time, so with speed or pitch away from unity it
//! runs at a different pace than the buffer position.
//!
//! End of buffer and device failures are not pushed to the caller; call
//! [`poll`](LiveSession::poll) periodically to apply them.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use tweak_core::{
    AudioBuffer, CompiledGraph, DEFAULT_BLOCK_SIZE, EffectParameters, build, check_output_length,
};

use crate::backend::{AudioBackend, BackendStreamConfig, StreamHandle};
use crate::clock::{Clock, MonotonicClock};
use crate::playback::{Command, Renderer, Shared};
use crate::{Error, Result};

const COMMAND_QUEUE: usize = 16;
const RETIRE_QUEUE: usize = 16;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Graph processing block size in frames.
    pub block_size: usize,
    /// Preferred device buffer size in frames. `None` lets the device decide.
    pub buffer_size: Option<u32>,
    /// Output channel count.
    pub channels: u16,
    /// Output device name, index or fragment. `None` uses the default.
    pub device: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            buffer_size: None,
            channels: 2,
            device: None,
        }
    }
}

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing playing; elapsed is the stored position (zero after an end).
    Idle,
    /// A graph is running on the audio thread.
    Playing,
    /// Output stopped; elapsed holds the position to resume from.
    Paused,
}

/// Transitions applied by [`LiveSession::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The buffer played to its end. The session is Idle at zero.
    Ended,
    /// The output stream failed. The session is Idle at zero and the stream is
    /// reopened on the next play.
    DeviceError(String),
}

/// The open output stream and its channels.
struct Output {
    _stream: StreamHandle,
    commands: SyncSender<Command>,
    retired: Receiver<Box<CompiledGraph>>,
    shared: Arc<Shared>,
    sample_rate: u32,
}

/// Real-time playback of one buffer with live-adjustable effects.
pub struct LiveSession<B: AudioBackend, C: Clock = MonotonicClock> {
    backend: B,
    clock: C,
    config: SessionConfig,
    buffer: Arc<AudioBuffer>,
    params: EffectParameters,
    state: PlaybackState,
    /// Clock reading, in seconds, at which position zero would have played.
    start_epoch: f64,
    /// Position while Paused or Idle.
    stored_elapsed: f64,
    generation: u64,
    output: Option<Output>,
}

impl<B: AudioBackend> LiveSession<B, MonotonicClock> {
    /// Creates an idle session on the wall clock.
    pub fn new(backend: B, buffer: Arc<AudioBuffer>, config: SessionConfig) -> Result<Self> {
        Self::with_clock(backend, MonotonicClock::new(), buffer, config)
    }
}

impl<B: AudioBackend, C: Clock> LiveSession<B, C> {
    /// Creates an idle session with an explicit clock.
    ///
    /// No stream is opened until the first [`play`](Self::play).
    pub fn with_clock(
        backend: B,
        clock: C,
        buffer: Arc<AudioBuffer>,
        config: SessionConfig,
    ) -> Result<Self> {
        if config.block_size == 0 {
            return Err(tweak_core::Error::invalid("block size must be at least one frame").into());
        }
        if config.channels == 0 {
            return Err(tweak_core::Error::invalid("output needs at least one channel").into());
        }
        check_buffer(&buffer)?;
        Ok(Self {
            backend,
            clock,
            config,
            buffer,
            params: EffectParameters::default(),
            state: PlaybackState::Idle,
            start_epoch: 0.0,
            stored_elapsed: 0.0,
            generation: 0,
            output: None,
        })
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Shorthand for `state() == Playing`.
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Current effect parameters.
    pub fn params(&self) -> &EffectParameters {
        &self.params
    }

    /// The buffer being played.
    pub fn buffer(&self) -> &Arc<AudioBuffer> {
        &self.buffer
    }

    /// Buffer duration in seconds at unity rate.
    pub fn duration(&self) -> f64 {
        self.buffer.duration_secs()
    }

    /// The backend the session opens streams on.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Elapsed playback time in seconds.
    pub fn elapsed(&self) -> f64 {
        match self.state {
            PlaybackState::Playing => self.now() - self.start_epoch,
            PlaybackState::Paused | PlaybackState::Idle => self.stored_elapsed,
        }
    }

    /// Starts playing from `from` seconds, replacing whatever is playing.
    ///
    /// Opens the output stream on first use. An offset at or past the end
    /// is accepted and ends on the next [`poll`](Self::poll).
    pub fn play(&mut self, from: f64) -> Result<()> {
        self.collect_retired();
        let graph = build(&self.buffer, &self.params.stages(), from)?
            .into_compiled(self.config.block_size)?;
        self.open_output()?;

        let generation = self.generation + 1;
        if let Err(e) = self.send(Command::Install {
            generation,
            graph: Box::new(graph),
        }) {
            tracing::warn!(error = %e, "graph hand-off failed, session reset");
            self.reset_output();
            return Err(e);
        }
        self.generation = generation;
        self.start_epoch = self.now() - from;
        self.state = PlaybackState::Playing;
        tracing::info!(from, generation = self.generation, "playback started");
        Ok(())
    }

    /// Stops output and remembers the position. No-op unless Playing.
    pub fn pause(&mut self) -> Result<()> {
        if self.state != PlaybackState::Playing {
            return Ok(());
        }
        self.stored_elapsed = self.elapsed();
        self.silence();
        self.state = PlaybackState::Paused;
        tracing::info!(elapsed = self.stored_elapsed, "playback paused");
        Ok(())
    }

    /// Plays from the stored position. No-op while Playing.
    pub fn resume(&mut self) -> Result<()> {
        if self.state == PlaybackState::Playing {
            return Ok(());
        }
        self.play(self.stored_elapsed)
    }

    /// Moves to `to` seconds.
    ///
    /// While Playing this restarts output there; otherwise it only updates
    /// the stored position.
    pub fn seek(&mut self, to: f64) -> Result<()> {
        if !to.is_finite() || to < 0.0 {
            return Err(tweak_core::Error::invalid(format!(
                "seek position must be finite and non-negative, got {to}"
            ))
            .into());
        }
        match self.state {
            PlaybackState::Playing => self.play(to),
            PlaybackState::Paused | PlaybackState::Idle => {
                self.stored_elapsed = to;
                Ok(())
            }
        }
    }

    /// Replaces the effect parameters.
    ///
    /// While Playing the graph is torn down and rebuilt at the current
    /// elapsed position. Parameters that could never be played from the
    /// start of the buffer are rejected in any state.
    pub fn set_params(&mut self, params: EffectParameters) -> Result<()> {
        params.validate()?;
        check_output_length(&self.buffer, params.playback_rate(), 0.0)?;
        let previous = std::mem::replace(&mut self.params, params);
        if self.state == PlaybackState::Playing {
            let at = self.elapsed();
            tracing::debug!(at, "rebuilding graph for new parameters");
            if let Err(e) = self.play(at) {
                // A graph that cannot be built leaves the old one playing.
                if e.is_invalid_input() {
                    self.params = previous;
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Stops output and returns to Idle at zero.
    pub fn stop(&mut self) -> Result<()> {
        self.silence();
        if self.state != PlaybackState::Idle {
            tracing::info!("playback stopped");
        }
        self.state = PlaybackState::Idle;
        self.stored_elapsed = 0.0;
        Ok(())
    }

    /// Swaps in a new buffer, stopping playback.
    ///
    /// The output stream is kept when the sample rate matches.
    pub fn replace_source(&mut self, buffer: Arc<AudioBuffer>) -> Result<()> {
        check_buffer(&buffer)?;
        self.stop()?;
        if self
            .output
            .as_ref()
            .is_some_and(|o| o.sample_rate != buffer.sample_rate())
        {
            self.output = None;
        }
        self.buffer = buffer;
        Ok(())
    }

    /// Applies end-of-buffer and device-failure transitions.
    pub fn poll(&mut self) -> Option<SessionEvent> {
        self.collect_retired();
        let (error, ended) = match &self.output {
            Some(o) => (o.shared.take_error(), o.shared.ended_generation()),
            None => return None,
        };

        if let Some(message) = error {
            tracing::warn!(error = %message, "output failed, session reset");
            self.reset_output();
            return Some(SessionEvent::DeviceError(message));
        }

        if self.state == PlaybackState::Playing && ended == self.generation {
            self.silence();
            self.state = PlaybackState::Idle;
            self.stored_elapsed = 0.0;
            tracing::info!("playback reached end of buffer");
            return Some(SessionEvent::Ended);
        }
        None
    }

    fn now(&self) -> f64 {
        self.clock.now().as_secs_f64()
    }

    fn open_output(&mut self) -> Result<()> {
        if self.output.is_some() {
            return Ok(());
        }

        let (commands, command_rx) = mpsc::sync_channel(COMMAND_QUEUE);
        let (retire_tx, retired) = mpsc::sync_channel(RETIRE_QUEUE);
        let shared = Arc::new(Shared::default());
        let stream_config = BackendStreamConfig {
            sample_rate: self.buffer.sample_rate(),
            buffer_size: self.config.buffer_size,
            channels: self.config.channels,
            device_name: self.config.device.clone(),
        };

        let mut renderer = Renderer::new(
            command_rx,
            retire_tx,
            Arc::clone(&shared),
            usize::from(self.config.channels),
        );
        let errors = Arc::clone(&shared);
        let stream = self.backend.build_output_stream(
            &stream_config,
            Box::new(move |data: &mut [f32]| renderer.fill(data)),
            Box::new(move |message: &str| {
                tracing::warn!(error = message, "output stream error");
                errors.report_error(message);
            }),
        )?;

        tracing::debug!(backend = self.backend.name(), "output opened");
        self.output = Some(Output {
            _stream: stream,
            commands,
            retired,
            shared,
            sample_rate: stream_config.sample_rate,
        });
        Ok(())
    }

    fn send(&self, command: Command) -> Result<()> {
        let Some(output) = &self.output else {
            return Err(Error::NoDevice);
        };
        output.commands.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => {
                Error::Device("audio callback is not draining commands".into())
            }
            TrySendError::Disconnected(_) => {
                Error::Device("audio callback has shut down".into())
            }
        })
    }

    /// Closes the stream and returns to Idle at zero. The next `play`
    /// reopens it.
    fn reset_output(&mut self) {
        self.output = None;
        self.state = PlaybackState::Idle;
        self.stored_elapsed = 0.0;
    }

    /// Tells the callback to drop its graph. If it cannot be reached the
    /// stream is closed instead.
    fn silence(&mut self) {
        let unreachable = self
            .output
            .as_ref()
            .is_some_and(|o| o.commands.try_send(Command::Clear).is_err());
        if unreachable {
            self.output = None;
        }
    }

    /// Frees graphs the callback has handed back.
    fn collect_retired(&self) {
        if let Some(output) = &self.output {
            output.retired.try_iter().for_each(drop);
        }
    }
}

fn check_buffer(buffer: &AudioBuffer) -> Result<()> {
    if buffer.is_empty() {
        return Err(tweak_core::Error::invalid("cannot play an empty buffer").into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, MockBackend};

    fn session() -> (LiveSession<MockBackend, ManualClock>, MockBackend, ManualClock) {
        let backend = MockBackend::new();
        let clock = ManualClock::new();
        let buffer = Arc::new(AudioBuffer::mono(vec![0.5; 8000 * 4], 8000).unwrap());
        let session = LiveSession::with_clock(
            backend.clone(),
            clock.clone(),
            buffer,
            SessionConfig {
                block_size: 128,
                ..SessionConfig::default()
            },
        )
        .unwrap();
        (session, backend, clock)
    }

    #[test]
    fn starts_idle_without_stream() {
        let (s, backend, _) = session();
        assert_eq!(s.state(), PlaybackState::Idle);
        assert_eq!(s.elapsed(), 0.0);
        assert_eq!(backend.streams_opened(), 0);
    }

    #[test]
    fn stream_opens_once_at_buffer_rate() {
        let (mut s, backend, _) = session();
        s.play(0.0).unwrap();
        s.pause().unwrap();
        s.resume().unwrap();
        assert_eq!(backend.streams_opened(), 1);
        let config = backend.last_config().unwrap();
        assert_eq!(config.sample_rate, 8000);
        assert_eq!(config.channels, 2);
    }

    #[test]
    fn pause_is_noop_when_idle() {
        let (mut s, _, clock) = session();
        s.pause().unwrap();
        clock.advance(1.0);
        assert_eq!(s.state(), PlaybackState::Idle);
        assert_eq!(s.elapsed(), 0.0);
    }

    #[test]
    fn rejects_bad_seek() {
        let (mut s, _, _) = session();
        assert!(s.seek(-1.0).unwrap_err().is_invalid_input());
        assert!(s.seek(f64::NAN).unwrap_err().is_invalid_input());
    }

    #[test]
    fn rejects_invalid_params_and_keeps_old() {
        let (mut s, _, _) = session();
        let bad = EffectParameters::default().with_volume(9.0);
        assert!(s.set_params(bad).unwrap_err().is_invalid_input());
        assert_eq!(*s.params(), EffectParameters::default());
    }

    #[test]
    fn rejects_empty_buffer() {
        let empty = Arc::new(AudioBuffer::silent(1, 0, 8000).unwrap());
        let err = LiveSession::with_clock(
            MockBackend::new(),
            ManualClock::new(),
            Arc::clone(&empty),
            SessionConfig::default(),
        )
        .err()
        .unwrap();
        assert!(err.is_invalid_input());

        let (mut s, _, _) = session();
        assert!(s.replace_source(empty).unwrap_err().is_invalid_input());
    }

    #[test]
    fn open_failure_leaves_session_idle() {
        let (mut s, backend, _) = session();
        backend.fail_next_open("device busy");
        assert!(matches!(s.play(0.0), Err(Error::Device(_))));
        assert_eq!(s.state(), PlaybackState::Idle);
        s.play(0.0).unwrap();
        assert!(s.is_playing());
    }
}
