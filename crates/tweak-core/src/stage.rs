//! Effect stages.
//!
//! A [`Stage`] inserts itself into an [`AudioGraph`] during a build. Stages
//! that change how the source plays (speed, pitch) reconfigure the source
//! node and add nothing; stages that process the signal add nodes after the
//! current terminal node and report the new terminal.
//!
//! The builder always applies stages in [`StageKind`] order, whatever order
//! the caller listed them in.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::Result;
use crate::graph::{AudioGraph, GraphError, NodeId, SourceNode};
use crate::impulse::{self, ImpulseResponse};
use crate::params::{REVERB_RANGE, SPEED_RANGE, VOLUME_RANGE, validate_in, validate_pitch};

/// Stage identity. The derived ordering is the application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageKind {
    /// Source playback rate.
    Speed,
    /// Source detune.
    Pitch,
    /// Convolution reverb with dry/wet mix.
    Reverb,
    /// Output gain.
    Gain,
}

impl StageKind {
    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Pitch => "pitch",
            Self::Reverb => "reverb",
            Self::Gain => "gain",
        }
    }
}

/// A setting a stage applies to the source node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceChange {
    /// Playback rate multiplier.
    PlaybackRate(f32),
    /// Detune in cents.
    Detune(f32),
}

/// One effect a graph build can apply.
pub trait Stage: core::fmt::Debug + Send + Sync {
    /// Which stage this is.
    fn kind(&self) -> StageKind;

    /// Rejects parameters outside the stage's domain.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// What the stage sets on the source, if anything.
    ///
    /// Builds use this to predict the output length before creating nodes.
    fn source_change(&self) -> Option<SourceChange> {
        None
    }

    /// Inserts the stage after `input`.
    ///
    /// Returns the nodes the stage produced. The first one, if any, becomes
    /// the new terminal node; an empty list leaves the terminal unchanged.
    fn attach(&self, graph: &mut AudioGraph, input: NodeId) -> Attached;
}

/// Nodes a stage added, or why it could not attach.
pub type Attached = core::result::Result<Vec<NodeId>, GraphError>;

/// An ordered list of boxed stages.
pub type StageList = Vec<Box<dyn Stage>>;

fn source_of(graph: &mut AudioGraph) -> core::result::Result<&mut SourceNode, GraphError> {
    graph
        .source_mut()
        .ok_or_else(|| GraphError::InvalidConnection("stage needs a source node".into()))
}

/// Sets the source playback rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedStage {
    rate: f32,
}

impl SpeedStage {
    /// Creates a speed stage with rate multiplier `rate`.
    pub fn new(rate: f32) -> Self {
        Self { rate }
    }

    /// Rate multiplier.
    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl Stage for SpeedStage {
    fn kind(&self) -> StageKind {
        StageKind::Speed
    }

    fn validate(&self) -> Result<()> {
        validate_in("speed", self.rate, &SPEED_RANGE)
    }

    fn source_change(&self) -> Option<SourceChange> {
        Some(SourceChange::PlaybackRate(self.rate))
    }

    fn attach(&self, graph: &mut AudioGraph, _input: NodeId) -> Attached {
        source_of(graph)?.set_playback_rate(self.rate);
        Ok(Vec::new())
    }
}

/// Shifts pitch by detuning the source, `100 * semitones` cents.
///
/// This is resampling, not time-stretching: one octave up halves the duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchStage {
    semitones: f32,
}

impl PitchStage {
    /// Creates a pitch stage.
    pub fn new(semitones: f32) -> Self {
        Self { semitones }
    }

    /// Shift in semitones.
    pub fn semitones(&self) -> f32 {
        self.semitones
    }

    /// Detune applied to the source, in cents.
    pub fn cents(&self) -> f32 {
        self.semitones * 100.0
    }
}

impl Stage for PitchStage {
    fn kind(&self) -> StageKind {
        StageKind::Pitch
    }

    fn validate(&self) -> Result<()> {
        validate_pitch(self.semitones)
    }

    fn source_change(&self) -> Option<SourceChange> {
        Some(SourceChange::Detune(self.cents()))
    }

    fn attach(&self, graph: &mut AudioGraph, _input: NodeId) -> Attached {
        source_of(graph)?.set_detune(self.cents());
        Ok(Vec::new())
    }
}

/// Convolution reverb with an equal-sum dry/wet split.
///
/// ```text
/// input -> dry gain (1 - amount) ---------------> sum
/// input -> convolver -> wet gain (amount) ------> sum
/// ```
///
/// A fresh impulse is synthesized on every attach unless a seed is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbStage {
    amount: f32,
    seed: Option<u64>,
}

impl ReverbStage {
    /// Creates a reverb stage with a random impulse.
    pub fn new(amount: f32) -> Self {
        Self { amount, seed: None }
    }

    /// Creates a reverb stage whose impulse is drawn from a seeded RNG.
    pub fn with_seed(amount: f32, seed: u64) -> Self {
        Self {
            amount,
            seed: Some(seed),
        }
    }

    /// Reverb amount.
    pub fn amount(&self) -> f32 {
        self.amount
    }

    /// Gain on the dry path.
    pub fn dry_gain(&self) -> f32 {
        1.0 - self.amount
    }

    /// Gain on the wet path.
    pub fn wet_gain(&self) -> f32 {
        self.amount
    }

    /// Synthesizes the impulse this stage would use at `sample_rate`.
    pub fn impulse(&self, sample_rate: u32) -> ImpulseResponse {
        match self.seed {
            Some(seed) => impulse::synthesize_with_rng(
                sample_rate,
                self.amount,
                &mut StdRng::seed_from_u64(seed),
            ),
            None => impulse::synthesize(sample_rate, self.amount),
        }
    }
}

impl Stage for ReverbStage {
    fn kind(&self) -> StageKind {
        StageKind::Reverb
    }

    fn validate(&self) -> Result<()> {
        validate_in("reverb amount", self.amount, &REVERB_RANGE)
    }

    fn attach(&self, graph: &mut AudioGraph, input: NodeId) -> Attached {
        let impulse = self.impulse(graph.sample_rate());
        let dry = graph.add_gain(self.dry_gain());
        let convolver = graph.add_convolver(impulse);
        let wet = graph.add_gain(self.wet_gain());
        let sum = graph.add_sum();

        graph.connect(input, dry)?;
        graph.connect(input, convolver)?;
        graph.connect(convolver, wet)?;
        graph.connect(dry, sum)?;
        graph.connect(wet, sum)?;
        Ok(vec![sum])
    }
}

/// Scalar output gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainStage {
    volume: f32,
}

impl GainStage {
    /// Creates a gain stage.
    pub fn new(volume: f32) -> Self {
        Self { volume }
    }

    /// Linear gain.
    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl Stage for GainStage {
    fn kind(&self) -> StageKind {
        StageKind::Gain
    }

    fn validate(&self) -> Result<()> {
        validate_in("volume", self.volume, &VOLUME_RANGE)
    }

    fn attach(&self, graph: &mut AudioGraph, input: NodeId) -> Attached {
        let gain = graph.add_gain(self.volume);
        graph.connect(input, gain)?;
        Ok(vec![gain])
    }
}
