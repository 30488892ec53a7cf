//! Block executor for a compiled graph.
//!
//! A [`CompiledGraph`] owns the nodes of an [`AudioGraph`](super::AudioGraph)
//! in topological order together with one pre-allocated output buffer per
//! node. [`process_block()`](CompiledGraph::process_block) walks the steps once
//! per block without allocating, so the same executor drives both the offline
//! renderer and the real-time callback.

use super::node::NodeKind;
use super::source::SourceNode;

/// One scheduled node: its index and its `(input node, weight)` list.
#[derive(Debug, Clone)]
pub(crate) struct Step {
    pub node: usize,
    pub inputs: Vec<(usize, f32)>,
}

/// A validated, sorted graph ready to process audio.
#[derive(Debug)]
pub struct CompiledGraph {
    nodes: Vec<NodeKind>,
    steps: Vec<Step>,
    /// Per-node output, `[channel][frame]`.
    outputs: Vec<Vec<Vec<f32>>>,
    destination: usize,
    source: usize,
    block_size: usize,
    channel_count: usize,
    sample_rate: u32,
    total_frames: u64,
    frames_done: u64,
}

impl CompiledGraph {
    pub(crate) fn new(
        nodes: Vec<NodeKind>,
        steps: Vec<Step>,
        block_size: usize,
        channel_count: usize,
        sample_rate: u32,
    ) -> Self {
        let position = |pred: fn(&NodeKind) -> bool| nodes.iter().position(pred).unwrap_or(0);
        let source = position(|k| matches!(k, NodeKind::Source(_)));
        let destination = position(|k| matches!(k, NodeKind::Destination));
        let total_frames = match &nodes[source] {
            NodeKind::Source(s) => s.remaining_frames(),
            _ => 0,
        };
        let outputs = vec![vec![vec![0.0; block_size]; channel_count]; nodes.len()];
        Self {
            nodes,
            steps,
            outputs,
            destination,
            source,
            block_size,
            channel_count,
            sample_rate,
            total_frames,
            frames_done: 0,
        }
    }

    /// Frames per block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Channels per block.
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Output frames the source produces in total.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Output frames already processed.
    pub fn frames_processed(&self) -> u64 {
        self.frames_done
    }

    /// Output frames still to come.
    pub fn remaining_frames(&self) -> u64 {
        self.total_frames.saturating_sub(self.frames_done)
    }

    /// True once the source has played to the end.
    pub fn is_finished(&self) -> bool {
        self.frames_done >= self.total_frames
    }

    /// The source node.
    pub fn source(&self) -> Option<&SourceNode> {
        match self.nodes.get(self.source)? {
            NodeKind::Source(s) => Some(s),
            _ => None,
        }
    }

    /// The last processed block, `[channel][frame]`.
    pub fn output(&self) -> &[Vec<f32>] {
        &self.outputs[self.destination]
    }

    /// Processes one block and returns how many of its frames carry signal.
    ///
    /// Frames beyond that count are silence (plus whatever reverb tail the
    /// convolver still holds). Once [`is_finished()`](Self::is_finished) the
    /// return value is zero.
    pub fn process_block(&mut self) -> usize {
        let valid = self.remaining_frames().min(self.block_size as u64) as usize;
        let block = self.block_size;
        let Self {
            nodes,
            steps,
            outputs,
            ..
        } = self;

        for step in steps.iter() {
            let mut out = std::mem::take(&mut outputs[step.node]);
            match &mut nodes[step.node] {
                NodeKind::Source(src) => {
                    src.render(&mut out, block);
                }
                NodeKind::Gain(gain) => {
                    let g = gain.gain();
                    let input = &outputs[step.inputs[0].0];
                    for (dst, src) in out.iter_mut().zip(input) {
                        for (d, &s) in dst.iter_mut().zip(src) {
                            *d = s * g;
                        }
                    }
                }
                NodeKind::Convolver(conv) => {
                    conv.process(&outputs[step.inputs[0].0], &mut out);
                }
                NodeKind::Sum => {
                    for ch in out.iter_mut() {
                        ch.fill(0.0);
                    }
                    for &(from, weight) in &step.inputs {
                        for (dst, src) in out.iter_mut().zip(&outputs[from]) {
                            for (d, &s) in dst.iter_mut().zip(src) {
                                *d += s * weight;
                            }
                        }
                    }
                }
                NodeKind::Destination => {
                    for (dst, src) in out.iter_mut().zip(&outputs[step.inputs[0].0]) {
                        dst.copy_from_slice(src);
                    }
                }
            }
            outputs[step.node] = out;
        }

        self.frames_done += valid as u64;
        valid
    }
}
