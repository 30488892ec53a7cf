//! Graph construction from a buffer and a stage list.
//!
//! [`build`] creates a source node for the buffer, applies the stages in
//! canonical order (speed, pitch, reverb, gain), and returns the graph with its
//! terminal node still open. [`BuiltGraph::into_compiled`] attaches the
//! destination and compiles.
//!
//! Every call builds an independent graph; nothing is shared between builds
//! except the read-only buffer.

use std::sync::Arc;

use crate::buffer::AudioBuffer;
use crate::error::{Error, Result};
use crate::graph::{AudioGraph, CompiledGraph, NodeId, SourceNode, effective_rate};
use crate::stage::{SourceChange, Stage};

/// Longest output a build accepts, in seconds at the buffer's sample rate.
pub const MAX_OUTPUT_SECONDS: f64 = 24.0 * 60.0 * 60.0;

/// A freshly built graph whose terminal node is not yet connected to an output.
#[derive(Debug)]
pub struct BuiltGraph {
    graph: AudioGraph,
    source: NodeId,
    output: NodeId,
}

impl BuiltGraph {
    /// The graph.
    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    /// The source node.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// The terminal node. Equals [`source()`](Self::source) when no stage
    /// added nodes.
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Attaches a destination to the terminal node and compiles.
    pub fn into_compiled(self, block_size: usize) -> Result<CompiledGraph> {
        let mut graph = self.graph;
        let destination = graph.add_destination()?;
        graph.connect(self.output, destination)?;
        Ok(graph.compile(block_size)?)
    }
}

/// Builds a graph that plays `buffer` from `start_offset` seconds through `stages`.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if the buffer has no frames, the offset is
///   negative or not finite, a stage's parameters are out of domain, or the
///   combined speed and pitch would stretch the output past
///   [`MAX_OUTPUT_SECONDS`].
/// - [`Error::Graph`] if a stage fails to attach.
pub fn build(
    buffer: &Arc<AudioBuffer>,
    stages: &[Box<dyn Stage>],
    start_offset: f64,
) -> Result<BuiltGraph> {
    if buffer.is_empty() {
        return Err(Error::invalid("buffer has no frames"));
    }
    if !start_offset.is_finite() || start_offset < 0.0 {
        return Err(Error::invalid(format!(
            "start offset {start_offset} must be a non-negative number of seconds"
        )));
    }
    for stage in stages {
        stage.validate()?;
    }

    let mut ordered: Vec<&Box<dyn Stage>> = stages.iter().collect();
    ordered.sort_by_key(|s| s.kind());

    let (mut playback_rate, mut detune) = (1.0, 0.0);
    for stage in &ordered {
        match stage.source_change() {
            Some(SourceChange::PlaybackRate(rate)) => playback_rate = rate,
            Some(SourceChange::Detune(cents)) => detune = cents,
            None => {}
        }
    }
    check_output_length(buffer, effective_rate(playback_rate, detune), start_offset)?;

    let mut graph = AudioGraph::new(buffer.channel_count(), buffer.sample_rate());
    let source = graph.add_source(SourceNode::new(Arc::clone(buffer), start_offset))?;
    let mut output = source;

    for stage in ordered {
        let produced = stage.attach(&mut graph, output)?;
        if let Some(&primary) = produced.first() {
            output = primary;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(
            stage = stage.kind().name(),
            nodes = produced.len(),
            "stage attached"
        );
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        stages = stages.len(),
        nodes = graph.node_count(),
        start_offset,
        "graph built"
    );

    Ok(BuiltGraph {
        graph,
        source,
        output,
    })
}

/// Checks that playing `buffer` from `start_offset` seconds at read rate
/// `rate` produces a finite output no longer than [`MAX_OUTPUT_SECONDS`].
///
/// ```rust
/// use tweak_core::{AudioBuffer, check_output_length};
///
/// let buffer = AudioBuffer::mono(vec![0.0; 48000], 48000)?;
/// assert!(check_output_length(&buffer, 0.5, 0.0).is_ok());
/// assert!(check_output_length(&buffer, 1e-9, 0.0).is_err());
/// # Ok::<(), tweak_core::Error>(())
/// ```
pub fn check_output_length(buffer: &AudioBuffer, rate: f64, start_offset: f64) -> Result<()> {
    if !(rate.is_finite() && rate > 0.0) {
        return Err(Error::invalid(format!(
            "effective playback rate {rate} is out of range"
        )));
    }
    let seconds = (buffer.duration_secs() - start_offset).max(0.0) / rate;
    if seconds > MAX_OUTPUT_SECONDS {
        return Err(Error::invalid(format!(
            "output would last {seconds:.3e} s, longer than the {MAX_OUTPUT_SECONDS} s limit"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;
    use crate::stage::{GainStage, PitchStage, ReverbStage, SpeedStage, StageList};

    fn buffer(frames: usize) -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer::mono(vec![0.5; frames], 8000).unwrap())
    }

    #[test]
    fn no_stages_leaves_source_as_output() {
        let built = build(&buffer(16), &[], 0.0).unwrap();
        assert_eq!(built.output(), built.source());
        assert_eq!(built.graph().node_count(), 1);
    }

    #[test]
    fn stages_applied_in_canonical_order() {
        let stages: StageList = vec![
            Box::new(GainStage::new(2.0)),
            Box::new(ReverbStage::with_seed(0.5, 9)),
            Box::new(PitchStage::new(12.0)),
            Box::new(SpeedStage::new(0.5)),
        ];
        let built = build(&buffer(16), &stages, 0.0).unwrap();
        let graph = built.graph();
        // Gain is last, so it is the terminal and fed by the reverb sum.
        assert_eq!(graph.gain(built.output()), Some(2.0));
        let (feeder, _) = graph.predecessors(built.output())[0];
        assert!(matches!(graph.kind(feeder), Some(NodeKind::Sum)));
        let src = graph.source().unwrap();
        assert_eq!(src.playback_rate(), 0.5);
        assert_eq!(src.detune(), 1200.0);
    }

    #[test]
    fn empty_buffer_rejected() {
        let empty = Arc::new(AudioBuffer::mono(Vec::new(), 8000).unwrap());
        assert!(build(&empty, &[], 0.0).unwrap_err().is_invalid_input());
    }

    #[test]
    fn bad_offset_rejected() {
        assert!(build(&buffer(8), &[], -1.0).unwrap_err().is_invalid_input());
        assert!(build(&buffer(8), &[], f64::NAN).unwrap_err().is_invalid_input());
    }

    #[test]
    fn out_of_domain_stage_rejected() {
        let stages: StageList = vec![Box::new(GainStage::new(9.0))];
        assert!(build(&buffer(8), &stages, 0.0).unwrap_err().is_invalid_input());
    }

    #[test]
    fn extreme_pitch_rejected_before_building() {
        // Finite pitch that would stretch 16 frames to ~1e26 frames.
        let down: StageList = vec![Box::new(PitchStage::new(-1000.0))];
        assert!(build(&buffer(16), &down, 0.0).unwrap_err().is_invalid_input());

        // 2^(1e6 / 12) overflows to an infinite rate.
        let up: StageList = vec![Box::new(PitchStage::new(1e6))];
        assert!(build(&buffer(16), &up, 0.0).unwrap_err().is_invalid_input());

        // Large but harmless shifts still build.
        let fast: StageList = vec![Box::new(PitchStage::new(1000.0))];
        let compiled = build(&buffer(16), &fast, 0.0)
            .unwrap()
            .into_compiled(4)
            .unwrap();
        assert_eq!(compiled.total_frames(), 1);
    }

    #[test]
    fn output_length_limit() {
        let one_second = buffer(8000);
        assert!(check_output_length(&one_second, 1.0 / (MAX_OUTPUT_SECONDS / 2.0), 0.0).is_ok());
        assert!(check_output_length(&one_second, 1.0 / (MAX_OUTPUT_SECONDS * 2.0), 0.0).is_err());
        // Starting past the end leaves nothing to stretch.
        assert!(check_output_length(&one_second, 1e-12, 2.0).is_ok());
        assert!(check_output_length(&one_second, 0.0, 0.0).is_err());
        assert!(check_output_length(&one_second, f64::NAN, 0.0).is_err());
    }

    #[test]
    fn last_speed_and_pitch_set_the_rate() {
        // Repeated stages overwrite the source setting, so the check follows
        // the last one, as attach does.
        let stages: StageList = vec![
            Box::new(PitchStage::new(-1000.0)),
            Box::new(PitchStage::new(0.0)),
        ];
        assert!(build(&buffer(16), &stages, 0.0).is_ok());
    }

    #[test]
    fn builds_are_independent() {
        let buf = buffer(32);
        let stages: StageList = vec![Box::new(GainStage::new(0.5))];
        let a = build(&buf, &stages, 0.0).unwrap();
        let b = build(&buf, &stages, 0.0).unwrap();
        assert_eq!(a.graph().node_count(), b.graph().node_count());
        assert_eq!(Arc::strong_count(&buf), 3);
    }

    #[test]
    fn compiles_with_destination() {
        let stages: StageList = vec![Box::new(GainStage::new(0.5))];
        let compiled = build(&buffer(10), &stages, 0.0)
            .unwrap()
            .into_compiled(4)
            .unwrap();
        assert_eq!(compiled.node_count(), 3);
        assert_eq!(compiled.total_frames(), 10);
    }
}
