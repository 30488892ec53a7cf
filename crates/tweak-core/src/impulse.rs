//! Synthetic reverb impulse responses.
//!
//! The impulse is white noise shaped by an exponential decay whose time
//! constant grows with the reverb amount:
//!
//! ```text
//! h[i] = u(-1, 1) * exp(-i / (sample_rate * (amount * 2 + 0.1)))
//! ```
//!
//! Each of the two channels draws its own noise, which decorrelates left and
//! right. [`synthesize`] pulls entropy from the thread RNG, so two calls never
//! produce the same samples; use [`synthesize_with_rng`] with a seeded RNG
//! when reproducible output matters.

use rand::Rng;

/// Impulse length in seconds.
pub const IMPULSE_SECONDS: usize = 2;

/// Channels in a synthesized impulse.
pub const IMPULSE_CHANNELS: usize = 2;

// ConvolverNode normalization constants (equal-power, calibrated at 44.1 kHz).
const GAIN_CALIBRATION: f32 = 0.00125;
const GAIN_CALIBRATION_SAMPLE_RATE: f32 = 44100.0;
const MIN_POWER: f32 = 0.000125;

/// A stereo impulse response, `2 * sample_rate` frames long.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl ImpulseResponse {
    /// Wraps pre-computed impulse channels.
    ///
    /// Used for measured impulses; all channels must have equal length.
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Option<Self> {
        let len = channels.first()?.len();
        if sample_rate == 0 || len == 0 || channels.iter().any(|c| c.len() != len) {
            return None;
        }
        Some(Self {
            channels,
            sample_rate,
        })
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Always false; an impulse has at least one frame.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Sample rate the impulse was generated for.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples of channel `idx`.
    pub fn channel(&self, idx: usize) -> &[f32] {
        &self.channels[idx]
    }

    /// All channels.
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Scale a normalizing convolver applies to this impulse.
    ///
    /// Equal-power normalization: the RMS over all channels is floored at
    /// `0.000125`, inverted, and calibrated to -58 dB at 44.1 kHz. Four-channel
    /// (true stereo) impulses are halved.
    pub fn normalization_scale(&self) -> f32 {
        let count = (self.channels.len() * self.len()) as f64;
        let sum_sq: f64 = self
            .channels
            .iter()
            .flat_map(|c| c.iter())
            .map(|&s| f64::from(s) * f64::from(s))
            .sum();
        let mut power = (sum_sq / count).sqrt() as f32;
        if !power.is_finite() || power < MIN_POWER {
            power = MIN_POWER;
        }
        let mut scale = GAIN_CALIBRATION / power;
        scale *= GAIN_CALIBRATION_SAMPLE_RATE / self.sample_rate as f32;
        if self.channels.len() == 4 {
            scale *= 0.5;
        }
        scale
    }
}

/// Decay time constant in seconds for a reverb amount.
#[inline]
pub fn decay_seconds(reverb_amount: f32) -> f32 {
    reverb_amount * 2.0 + 0.1
}

/// Synthesizes an impulse using the thread-local RNG.
pub fn synthesize(sample_rate: u32, reverb_amount: f32) -> ImpulseResponse {
    synthesize_with_rng(sample_rate, reverb_amount, &mut rand::thread_rng())
}

/// Synthesizes an impulse drawing noise from `rng`.
///
/// # Panics
///
/// Panics if `sample_rate` is zero.
pub fn synthesize_with_rng<R: Rng>(
    sample_rate: u32,
    reverb_amount: f32,
    rng: &mut R,
) -> ImpulseResponse {
    assert!(sample_rate > 0, "sample rate must be non-zero");
    let length = IMPULSE_SECONDS * sample_rate as usize;
    let tau = f64::from(sample_rate) * f64::from(decay_seconds(reverb_amount));

    let channels = (0..IMPULSE_CHANNELS)
        .map(|_| {
            (0..length)
                .map(|i| {
                    let decay = (-(i as f64) / tau).exp() as f32;
                    rng.gen_range(-1.0_f32..=1.0) * decay
                })
                .collect()
        })
        .collect();

    #[cfg(feature = "tracing")]
    tracing::debug!(sample_rate, reverb_amount, length, "impulse synthesized");

    ImpulseResponse {
        channels,
        sample_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn shape_is_two_seconds_stereo() {
        let ir = synthesize(8000, 0.5);
        assert_eq!(ir.channel_count(), 2);
        assert_eq!(ir.len(), 16000);
        assert_eq!(ir.sample_rate(), 8000);
    }

    #[test]
    fn magnitudes_bounded() {
        for amount in [0.0, 0.25, 1.0] {
            let ir = synthesize(4000, amount);
            assert!(
                ir.channels()
                    .iter()
                    .flat_map(|c| c.iter())
                    .all(|s| s.abs() <= 1.0)
            );
        }
    }

    #[test]
    fn seeded_synthesis_is_reproducible() {
        let a = synthesize_with_rng(4000, 0.3, &mut StdRng::seed_from_u64(7));
        let b = synthesize_with_rng(4000, 0.3, &mut StdRng::seed_from_u64(7));
        let c = synthesize_with_rng(4000, 0.3, &mut StdRng::seed_from_u64(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn channels_are_independent() {
        let ir = synthesize_with_rng(4000, 0.5, &mut StdRng::seed_from_u64(1));
        assert_ne!(ir.channel(0), ir.channel(1));
    }

    #[test]
    fn zero_amount_is_nearly_silent_after_half_a_second() {
        // tau = 0.1 s, so 0.5 s in the envelope is exp(-5) < 0.007.
        let sr = 4000;
        let ir = synthesize(sr, 0.0);
        let tail = &ir.channel(0)[sr as usize / 2..];
        assert!(tail.iter().all(|s| s.abs() < 0.007));
    }

    #[test]
    fn more_reverb_decays_slower() {
        let sr = 4000;
        let energy = |amount: f32| -> f32 {
            let ir = synthesize_with_rng(sr, amount, &mut StdRng::seed_from_u64(3));
            ir.channel(0)[sr as usize..].iter().map(|s| s * s).sum()
        };
        assert!(energy(1.0) > energy(0.5));
        assert!(energy(0.5) > energy(0.0));
    }

    #[test]
    fn normalization_floors_power() {
        let silent = ImpulseResponse::from_channels(vec![vec![0.0; 100]; 2], 44100).unwrap();
        assert!((silent.normalization_scale() - GAIN_CALIBRATION / MIN_POWER).abs() < 1e-3);
    }

    #[test]
    fn normalization_scales_with_sample_rate() {
        let ir = ImpulseResponse::from_channels(vec![vec![0.5; 100]; 2], 44100).unwrap();
        let ir2 = ImpulseResponse::from_channels(vec![vec![0.5; 100]; 2], 88200).unwrap();
        let ratio = ir.normalization_scale() / ir2.normalization_scale();
        assert!((ratio - 2.0).abs() < 1e-4);
        // RMS 0.5 -> 0.00125 / 0.5
        assert!((ir.normalization_scale() - 0.0025).abs() < 1e-6);
    }

    #[test]
    fn from_channels_rejects_ragged() {
        assert!(ImpulseResponse::from_channels(vec![vec![0.0; 3], vec![0.0; 2]], 8000).is_none());
        assert!(ImpulseResponse::from_channels(Vec::new(), 8000).is_none());
    }
}
