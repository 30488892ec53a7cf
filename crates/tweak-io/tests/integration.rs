//! Integration tests for tweak-io: WAV files through the offline renderer, and
//! live sessions driven by the mock backend and a manual clock.

use std::sync::Arc;

use tempfile::NamedTempFile;
use tweak_core::{AudioBuffer, EffectParameters, render_with_params};
use tweak_io::{
    Error, LiveSession, ManualClock, MockBackend, PlaybackState, SessionConfig, SessionEvent,
    WavFormat, decode, encode, read_wav, write_wav,
};

const SR: u32 = 8000;

type TestSession = LiveSession<MockBackend, ManualClock>;

/// Mono ramp where sample `i` is `i / frames`.
fn ramp(frames: usize) -> Arc<AudioBuffer> {
    let ch = (0..frames).map(|i| i as f32 / frames as f32).collect();
    Arc::new(AudioBuffer::mono(ch, SR).unwrap())
}

fn constant(value: f32, frames: usize) -> Arc<AudioBuffer> {
    Arc::new(AudioBuffer::mono(vec![value; frames], SR).unwrap())
}

fn session_for(buffer: Arc<AudioBuffer>) -> (TestSession, MockBackend, ManualClock) {
    let backend = MockBackend::new();
    let clock = ManualClock::new();
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

fn assert_near(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

// ---------------------------------------------------------------------------
// WAV
// ---------------------------------------------------------------------------

#[test]
fn rendered_file_roundtrip() {
    let input = ramp(4000);
    let params = EffectParameters::default().with_volume(0.5).with_pitch(12.0);
    let output = render_with_params(&input, &params).unwrap();

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &output, WavFormat::Pcm16).unwrap();
    let loaded = read_wav(file.path()).unwrap();

    assert_eq!(loaded.sample_rate(), SR);
    assert_eq!(loaded.channel_count(), 1);
    assert_eq!(loaded.frame_count(), 2000);
    for (a, b) in output.channel(0).iter().zip(loaded.channel(0)) {
        assert!((a - b).abs() < 1.0 / 16384.0);
    }
}

#[test]
fn encode_matches_file_bytes() {
    let input = ramp(500);
    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &input, WavFormat::Pcm16).unwrap();
    let on_disk = std::fs::read(file.path()).unwrap();
    assert_eq!(on_disk, encode(&input).unwrap());
    assert_eq!(decode(&on_disk).unwrap().frame_count(), 500);
}

#[test]
fn missing_file_is_an_error() {
    let err = read_wav("/definitely/not/here.wav").unwrap_err();
    assert!(matches!(err, Error::Wav(_) | Error::Io(_)));
}

// ---------------------------------------------------------------------------
// Elapsed time
// ---------------------------------------------------------------------------

#[test]
fn seek_while_playing_moves_elapsed() {
    let (mut s, _, clock) = session_for(constant(0.5, SR as usize * 4));
    s.play(0.0).unwrap();
    clock.advance(0.5);
    assert_near(s.elapsed(), 0.5);

    s.seek(2.0).unwrap();
    assert!(s.is_playing());
    assert_near(s.elapsed(), 2.0);
    clock.advance(0.25);
    assert_near(s.elapsed(), 2.25);
}

#[test]
fn pause_then_resume_continues() {
    let (mut s, _, clock) = session_for(constant(0.5, SR as usize * 4));
    s.play(0.0).unwrap();
    clock.advance(1.0);
    s.pause().unwrap();
    assert_eq!(s.state(), PlaybackState::Paused);
    assert_near(s.elapsed(), 1.0);

    clock.advance(5.0);
    assert_near(s.elapsed(), 1.0);

    s.resume().unwrap();
    assert!(s.is_playing());
    assert_near(s.elapsed(), 1.0);
    clock.advance(0.5);
    assert_near(s.elapsed(), 1.5);
}

#[test]
fn seek_while_paused_only_stores() {
    let (mut s, backend, clock) = session_for(ramp(SR as usize * 4));
    s.play(0.0).unwrap();
    backend.pull(64);
    s.pause().unwrap();
    s.seek(3.0).unwrap();
    assert_eq!(s.state(), PlaybackState::Paused);
    assert_near(s.elapsed(), 3.0);
    assert!(backend.pull(64).iter().all(|&x| x == 0.0));

    clock.advance(1.0);
    s.resume().unwrap();
    let out = backend.pull(1);
    assert_near(f64::from(out[0]), 0.75);
}

#[test]
fn seek_while_idle_sets_start_point() {
    let (mut s, backend, _) = session_for(ramp(SR as usize * 2));
    s.seek(1.0).unwrap();
    assert_eq!(s.state(), PlaybackState::Idle);
    assert_eq!(backend.streams_opened(), 0);
    s.resume().unwrap();
    let out = backend.pull(1);
    assert_near(f64::from(out[0]), 0.5);
}

#[test]
fn stop_returns_to_zero() {
    let (mut s, backend, clock) = session_for(constant(0.5, 8000));
    s.play(0.0).unwrap();
    clock.advance(0.3);
    s.stop().unwrap();
    assert_eq!(s.state(), PlaybackState::Idle);
    assert_eq!(s.elapsed(), 0.0);
    assert!(backend.pull(32).iter().all(|&x| x == 0.0));
}

// ---------------------------------------------------------------------------
// Audio path
// ---------------------------------------------------------------------------

#[test]
fn output_carries_effects() {
    let (mut s, backend, _) = session_for(constant(0.25, 8000));
    s.set_params(EffectParameters::default().with_volume(2.0))
        .unwrap();
    s.play(0.0).unwrap();
    let out = backend.pull(300);
    assert_eq!(out.len(), 600);
    assert!(out.iter().all(|&x| x == 0.5));
}

#[test]
fn stereo_channels_stay_separate() {
    let buffer = Arc::new(AudioBuffer::new(vec![vec![0.1; 400], vec![-0.2; 400]], SR).unwrap());
    let (mut s, backend, _) = session_for(buffer);
    s.play(0.0).unwrap();
    let out = backend.pull(200);
    for frame in out.chunks(2) {
        assert_eq!(frame, &[0.1, -0.2]);
    }
}

#[test]
fn param_change_rebuilds_at_elapsed() {
    let (mut s, backend, clock) = session_for(ramp(SR as usize * 4));
    s.play(0.0).unwrap();
    backend.pull(256);
    clock.advance(1.0);

    s.set_params(EffectParameters::default().with_volume(2.0))
        .unwrap();
    assert!(s.is_playing());
    assert_near(s.elapsed(), 1.0);
    // Position 1 s of a 4 s ramp is 0.25, doubled.
    let out = backend.pull(1);
    assert_near(f64::from(out[0]), 0.5);
}

#[test]
fn param_change_while_paused_applies_on_resume() {
    let (mut s, backend, clock) = session_for(constant(0.25, 8000));
    s.play(0.0).unwrap();
    clock.advance(0.1);
    s.pause().unwrap();
    s.set_params(EffectParameters::default().with_volume(0.0))
        .unwrap();
    assert_eq!(s.state(), PlaybackState::Paused);
    s.resume().unwrap();
    assert!(backend.pull(100).iter().all(|&x| x == 0.0));
}

#[test]
fn many_rebuilds_do_not_stall() {
    let (mut s, backend, clock) = session_for(constant(0.25, SR as usize * 10));
    s.play(0.0).unwrap();
    for i in 0..64 {
        clock.advance(0.01);
        s.set_params(EffectParameters::default().with_reverb((i % 10) as f32 / 10.0))
            .unwrap();
        backend.pull(64);
        assert_eq!(s.poll(), None);
    }
    assert!(s.is_playing());
}

// ---------------------------------------------------------------------------
// End of buffer and failures
// ---------------------------------------------------------------------------

#[test]
fn natural_end_goes_idle_at_zero() {
    let (mut s, backend, clock) = session_for(constant(0.5, 1000));
    s.play(0.0).unwrap();
    assert_eq!(s.poll(), None);

    backend.pull(2000);
    clock.advance(0.25);
    assert_eq!(s.poll(), Some(SessionEvent::Ended));
    assert_eq!(s.state(), PlaybackState::Idle);
    assert_eq!(s.elapsed(), 0.0);
    assert_eq!(s.poll(), None);
}

#[test]
fn end_of_replaced_graph_is_ignored() {
    let (mut s, backend, _) = session_for(constant(0.5, 1000));
    s.play(0.0).unwrap();
    backend.pull(2000);
    // The first graph ended, but a new one starts before the poll.
    s.play(0.0).unwrap();
    assert_eq!(s.poll(), None);
    assert!(s.is_playing());
}

#[test]
fn play_past_end_ends_on_poll() {
    let (mut s, backend, _) = session_for(constant(0.5, 1000));
    s.play(10.0).unwrap();
    assert!(backend.pull(16).iter().all(|&x| x == 0.0));
    assert_eq!(s.poll(), Some(SessionEvent::Ended));
}

#[test]
fn device_error_resets_and_reopens() {
    let (mut s, backend, clock) = session_for(constant(0.5, 8000));
    s.play(0.0).unwrap();
    clock.advance(0.2);
    backend.raise_error("device unplugged");

    assert_eq!(
        s.poll(),
        Some(SessionEvent::DeviceError("device unplugged".into()))
    );
    assert_eq!(s.state(), PlaybackState::Idle);
    assert_eq!(s.elapsed(), 0.0);
    assert!(!backend.is_active());

    s.play(0.0).unwrap();
    assert_eq!(backend.streams_opened(), 2);
    assert!(backend.pull(8).iter().all(|&x| x == 0.5));
}

#[test]
fn stalled_callback_resets_session() {
    let (mut s, backend, clock) = session_for(constant(0.5, 1000));

    // Nothing pulls, so the command queue eventually fills.
    let mut failure = None;
    for _ in 0..64 {
        if let Err(e) = s.play(0.0) {
            failure = Some(e);
            break;
        }
    }
    assert!(matches!(failure, Some(Error::Device(_))));
    assert_eq!(s.state(), PlaybackState::Idle);
    assert_eq!(s.elapsed(), 0.0);
    assert!(!backend.is_active());
    assert_eq!(s.poll(), None);

    // A fresh stream still reports the natural end.
    s.play(0.0).unwrap();
    assert_eq!(backend.streams_opened(), 2);
    backend.pull(2000);
    clock.advance(0.25);
    assert_eq!(s.poll(), Some(SessionEvent::Ended));
    assert_eq!(s.state(), PlaybackState::Idle);
}

#[test]
fn unplayable_params_are_rejected_in_any_state() {
    let (mut s, backend, clock) = session_for(constant(0.5, 8000));
    let extreme = EffectParameters::default().with_pitch(-1000.0);

    let err = s.set_params(extreme).unwrap_err();
    assert!(err.is_invalid_input());
    assert_eq!(*s.params(), EffectParameters::default());

    s.play(0.0).unwrap();
    clock.advance(0.1);
    assert!(s.set_params(extreme).is_err());
    assert_eq!(*s.params(), EffectParameters::default());
    assert!(s.is_playing());
    assert!(backend.pull(8).iter().all(|&x| x == 0.5));
}

#[test]
fn replace_source_stops_and_reopens_on_rate_change() {
    let (mut s, backend, clock) = session_for(constant(0.5, 8000));
    s.play(0.0).unwrap();
    clock.advance(0.5);

    let other = Arc::new(AudioBuffer::mono(vec![0.125; 4410], 44100).unwrap());
    s.replace_source(Arc::clone(&other)).unwrap();
    assert_eq!(s.state(), PlaybackState::Idle);
    assert_eq!(s.elapsed(), 0.0);
    assert_near(s.duration(), 0.1);

    s.play(0.0).unwrap();
    assert_eq!(backend.streams_opened(), 2);
    assert_eq!(backend.last_config().unwrap().sample_rate, 44100);
    assert!(backend.pull(16).iter().all(|&x| x == 0.125));
}
