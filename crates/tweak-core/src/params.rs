//! Processing parameters and their documented domains.

use core::ops::RangeInclusive;

use crate::error::{Error, Result};
use crate::stage::{GainStage, PitchStage, ReverbStage, SpeedStage, StageList};

/// Pitch range the UI exposes, in semitones. The pitch stage itself is unclamped.
pub const PITCH_RANGE: RangeInclusive<f32> = -12.0..=12.0;

/// Reverb amount domain (0 = dry, 1 = fully wet).
pub const REVERB_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// Volume domain as linear gain (0% to 500%).
pub const VOLUME_RANGE: RangeInclusive<f32> = 0.0..=5.0;

/// Playback speed domain as a rate multiplier.
pub const SPEED_RANGE: RangeInclusive<f32> = 0.25..=4.0;

/// The parameter set a graph is built from.
///
/// Values are plain data: every build or render receives a fresh copy and the
/// core never mutates it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EffectParameters {
    /// Pitch shift in semitones. Also changes duration.
    pub pitch_semitones: f32,
    /// Reverb dry/wet amount in `[0, 1]`.
    pub reverb_amount: f32,
    /// Output gain in `[0, 5]`.
    pub volume: f32,
    /// Playback rate multiplier in `[0.25, 4]`.
    pub speed: f32,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            pitch_semitones: 0.0,
            reverb_amount: 0.0,
            volume: 1.0,
            speed: 1.0,
        }
    }
}

impl EffectParameters {
    /// Sets the pitch shift in semitones.
    pub fn with_pitch(mut self, semitones: f32) -> Self {
        self.pitch_semitones = semitones;
        self
    }

    /// Sets the reverb amount.
    pub fn with_reverb(mut self, amount: f32) -> Self {
        self.reverb_amount = amount;
        self
    }

    /// Sets the output volume.
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Sets the playback speed.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Checks every field against its domain.
    ///
    /// Pitch only has to be finite; reverb, volume and speed must lie inside
    /// [`REVERB_RANGE`], [`VOLUME_RANGE`] and [`SPEED_RANGE`].
    pub fn validate(&self) -> Result<()> {
        validate_pitch(self.pitch_semitones)?;
        validate_in("reverb amount", self.reverb_amount, &REVERB_RANGE)?;
        validate_in("volume", self.volume, &VOLUME_RANGE)?;
        validate_in("speed", self.speed, &SPEED_RANGE)
    }

    /// Rate the source plays at: `speed * 2^(semitones / 12)`.
    pub fn playback_rate(&self) -> f64 {
        f64::from(self.speed) * 2f64.powf(f64::from(self.pitch_semitones) / 12.0)
    }

    /// Predicted output length in frames for an input of `frames` frames.
    pub fn output_frames(&self, frames: usize) -> usize {
        (frames as f64 / self.playback_rate()).ceil() as usize
    }

    /// Canonical stage list for these parameters.
    ///
    /// Stages that would be a no-op (unit speed, zero pitch, zero reverb,
    /// unit volume) are left out so the built graph stays minimal.
    pub fn stages(&self) -> StageList {
        let mut stages = StageList::new();
        if self.speed != 1.0 {
            stages.push(Box::new(SpeedStage::new(self.speed)));
        }
        if self.pitch_semitones != 0.0 {
            stages.push(Box::new(PitchStage::new(self.pitch_semitones)));
        }
        if self.reverb_amount != 0.0 {
            stages.push(Box::new(ReverbStage::new(self.reverb_amount)));
        }
        if self.volume != 1.0 {
            stages.push(Box::new(GainStage::new(self.volume)));
        }
        stages
    }

    /// Like [`stages()`](Self::stages), with a seeded reverb impulse.
    pub fn seeded_stages(&self, seed: u64) -> StageList {
        let mut stages = self.stages();
        for stage in &mut stages {
            if stage.kind() == crate::stage::StageKind::Reverb {
                *stage = Box::new(ReverbStage::with_seed(self.reverb_amount, seed));
            }
        }
        stages
    }
}

pub(crate) fn validate_pitch(semitones: f32) -> Result<()> {
    if semitones.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid(format!("pitch {semitones} is not finite")))
    }
}

pub(crate) fn validate_in(name: &str, value: f32, range: &RangeInclusive<f32>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid(format!(
            "{name} {value} outside [{}, {}]",
            range.start(),
            range.end()
        )))
    }
}
