//! Decoded multichannel audio.
//!
//! [`AudioBuffer`] is the value that flows in and out of the core: decoders
//! produce one, the offline renderer returns a new one, and the live session
//! shares one with the audio thread behind an `Arc`. It is immutable once
//! built, so sharing it never needs a lock.

use crate::error::{Error, Result};

/// Upper bound on channels per buffer.
pub const MAX_CHANNELS: usize = 32;

/// Planar (non-interleaved) f32 audio with a fixed sample rate.
///
/// Invariants, checked on construction:
/// - at least one and at most [`MAX_CHANNELS`] channels
/// - every channel holds exactly [`frame_count()`](Self::frame_count) samples
/// - `sample_rate > 0`
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
    frame_count: usize,
}

impl AudioBuffer {
    /// Builds a buffer from planar channel data.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::invalid("sample rate must be greater than zero"));
        }
        if channels.is_empty() {
            return Err(Error::invalid("buffer has no channels"));
        }
        if channels.len() > MAX_CHANNELS {
            return Err(Error::invalid(format!(
                "buffer has {} channels, at most {MAX_CHANNELS} supported",
                channels.len()
            )));
        }
        let frame_count = channels[0].len();
        if let Some((idx, ch)) = channels
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != frame_count)
        {
            return Err(Error::invalid(format!(
                "channel {idx} has {} frames, expected {frame_count}",
                ch.len()
            )));
        }
        Ok(Self {
            channels,
            sample_rate,
            frame_count,
        })
    }

    /// Builds a zero-filled buffer.
    pub fn silent(channel_count: usize, frame_count: usize, sample_rate: u32) -> Result<Self> {
        Self::new(vec![vec![0.0; frame_count]; channel_count], sample_rate)
    }

    /// Builds a single-channel buffer.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Deinterleaves `[c0, c1, .., c0, c1, ..]` samples into a planar buffer.
    ///
    /// A trailing partial frame is rejected.
    pub fn from_interleaved(samples: &[f32], channel_count: usize, sample_rate: u32) -> Result<Self> {
        if channel_count == 0 {
            return Err(Error::invalid("buffer has no channels"));
        }
        if samples.len() % channel_count != 0 {
            return Err(Error::invalid(format!(
                "{} interleaved samples is not a whole number of {channel_count}-channel frames",
                samples.len()
            )));
        }
        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Self::new(channels, sample_rate)
    }

    /// Interleaves the channels into a single vector.
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.frame_count * self.channels.len());
        for i in 0..self.frame_count {
            for ch in &self.channels {
                out.push(ch[i]);
            }
        }
        out
    }

    /// Number of channels.
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frame_count as f64 / f64::from(self.sample_rate)
    }

    /// Returns true when the buffer holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Samples of channel `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= channel_count()`.
    #[inline]
    pub fn channel(&self, idx: usize) -> &[f32] {
        &self.channels[idx]
    }

    /// All channels, in order.
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Consumes the buffer and returns its planar channel data.
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Largest absolute sample value across all channels.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }
}
