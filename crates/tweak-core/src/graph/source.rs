//! Buffer playback node.
//!
//! A [`SourceNode`] reads an [`AudioBuffer`] at a variable rate with linear
//! interpolation. The effective rate combines the playback rate and the detune
//! the same way a resampling player does:
//!
//! ```text
//! rate = playback_rate * 2^(detune_cents / 1200)
//! ```
//!
//! Output frame `k` reads input position `start + k * rate`. Playback ends once
//! that position passes the last input frame, so a source started at frame `s`
//! produces `ceil((frames - s) / rate)` frames.

use std::sync::Arc;

use crate::buffer::AudioBuffer;

/// Read increment per output frame for a playback rate and detune.
pub fn effective_rate(playback_rate: f32, detune_cents: f32) -> f64 {
    f64::from(playback_rate) * 2f64.powf(f64::from(detune_cents) / 1200.0)
}

/// Plays a shared buffer from a start offset at a variable rate.
#[derive(Debug, Clone)]
pub struct SourceNode {
    buffer: Arc<AudioBuffer>,
    start_frame: f64,
    playback_rate: f32,
    detune_cents: f32,
    emitted: u64,
}

impl SourceNode {
    /// Creates a source that starts `start_secs` into `buffer`.
    ///
    /// Negative or non-finite offsets start at the beginning.
    pub fn new(buffer: Arc<AudioBuffer>, start_secs: f64) -> Self {
        let start_secs = if start_secs.is_finite() { start_secs.max(0.0) } else { 0.0 };
        let start_frame = start_secs * f64::from(buffer.sample_rate());
        Self {
            buffer,
            start_frame,
            playback_rate: 1.0,
            detune_cents: 0.0,
            emitted: 0,
        }
    }

    /// The buffer being played.
    pub fn buffer(&self) -> &Arc<AudioBuffer> {
        &self.buffer
    }

    /// Input frame playback starts from.
    pub fn start_frame(&self) -> f64 {
        self.start_frame
    }

    /// Playback rate multiplier (speed).
    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    /// Sets the playback rate multiplier.
    pub fn set_playback_rate(&mut self, rate: f32) {
        self.playback_rate = rate;
    }

    /// Detune in cents.
    pub fn detune(&self) -> f32 {
        self.detune_cents
    }

    /// Sets the detune in cents (100 cents per semitone).
    pub fn set_detune(&mut self, cents: f32) {
        self.detune_cents = cents;
    }

    /// Effective read increment per output frame.
    pub fn computed_rate(&self) -> f64 {
        effective_rate(self.playback_rate, self.detune_cents)
    }

    /// Output frames from the start offset to the end of the buffer.
    pub fn total_frames(&self) -> u64 {
        let frames = self.buffer.frame_count() as f64;
        let rate = self.computed_rate();
        if self.start_frame >= frames || !(rate > 0.0) {
            return 0;
        }
        ((frames - self.start_frame) / rate).ceil() as u64
    }

    /// Output frames not yet produced.
    pub fn remaining_frames(&self) -> u64 {
        self.total_frames().saturating_sub(self.emitted)
    }

    /// Output frames produced so far.
    pub fn frames_emitted(&self) -> u64 {
        self.emitted
    }

    /// Writes the next `frames` output frames into `out`, one slice per channel.
    ///
    /// Frames past the end of playback are zero. Returns how many frames carried
    /// signal.
    pub(crate) fn render(&mut self, out: &mut [Vec<f32>], frames: usize) -> usize {
        let total = self.total_frames();
        let rate = self.computed_rate();
        let len = self.buffer.frame_count();
        let mut valid = 0;

        for k in 0..frames {
            let idx = self.emitted + k as u64;
            let pos = self.start_frame + idx as f64 * rate;
            let i = pos.floor() as usize;
            if idx >= total || i >= len {
                for ch in out.iter_mut() {
                    ch[k] = 0.0;
                }
                continue;
            }
            let frac = (pos - i as f64) as f32;
            let next = (i + 1).min(len - 1);
            for (c, ch) in out.iter_mut().enumerate() {
                let x = self.buffer.channel(c % self.buffer.channel_count());
                ch[k] = x[i] + (x[next] - x[i]) * frac;
            }
            valid = k + 1;
        }

        self.emitted += frames as u64;
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer::mono((0..n).map(|i| i as f32).collect(), 1000).unwrap())
    }

    #[test]
    fn unit_rate_is_identity() {
        let mut src = SourceNode::new(ramp(8), 0.0);
        let mut out = vec![vec![0.0; 8]];
        assert_eq!(src.render(&mut out, 8), 8);
        assert_eq!(out[0], (0..8).map(|i| i as f32).collect::<Vec<_>>());
        assert_eq!(src.remaining_frames(), 0);
    }

    #[test]
    fn octave_detune_doubles_rate() {
        let mut src = SourceNode::new(ramp(8), 0.0);
        src.set_detune(1200.0);
        assert!((src.computed_rate() - 2.0).abs() < 1e-12);
        assert_eq!(src.total_frames(), 4);
        let mut out = vec![vec![0.0; 6]];
        assert_eq!(src.render(&mut out, 6), 4);
        assert_eq!(out[0], vec![0.0, 2.0, 4.0, 6.0, 0.0, 0.0]);
    }

    #[test]
    fn half_rate_interpolates() {
        let mut src = SourceNode::new(ramp(4), 0.0);
        src.set_playback_rate(0.5);
        assert_eq!(src.total_frames(), 8);
        let mut out = vec![vec![0.0; 8]];
        src.render(&mut out, 8);
        // Past the last frame the interpolation holds the final sample.
        assert_eq!(out[0], vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.0]);
    }

    #[test]
    fn start_offset_skips_frames() {
        // 1000 Hz buffer, 3 ms in = frame 3.
        let mut src = SourceNode::new(ramp(8), 0.003);
        assert_eq!(src.total_frames(), 5);
        let mut out = vec![vec![0.0; 5]];
        src.render(&mut out, 5);
        assert_eq!(out[0][0], 3.0);
        assert_eq!(out[0][4], 7.0);
    }

    #[test]
    fn offset_past_end_is_silent() {
        let src = SourceNode::new(ramp(8), 1.0);
        assert_eq!(src.total_frames(), 0);
        assert_eq!(src.remaining_frames(), 0);
    }

    #[test]
    fn render_across_calls_continues() {
        let mut src = SourceNode::new(ramp(6), 0.0);
        let mut out = vec![vec![0.0; 4]];
        src.render(&mut out, 4);
        assert_eq!(src.remaining_frames(), 2);
        assert_eq!(src.render(&mut out, 4), 2);
        assert_eq!(out[0], vec![4.0, 5.0, 0.0, 0.0]);
    }
}
