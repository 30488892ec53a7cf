//! Graph node types.
//!
//! Each node in an [`AudioGraph`](super::AudioGraph) has a [`NodeId`] and a
//! [`NodeKind`] that determines what it does to the signal. `NodeData` bundles
//! the kind with adjacency lists.

use super::convolver::ConvolverNode;
use super::edge::EdgeId;
use super::source::SourceNode;

/// Unique identifier for a node in an audio graph.
///
/// Node IDs are assigned sequentially and never reused within a graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Scalar gain node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainNode {
    gain: f32,
}

impl GainNode {
    /// Creates a gain node.
    pub fn new(gain: f32) -> Self {
        Self { gain }
    }

    /// Linear gain applied to every sample.
    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }
}

/// The role of a node in the graph.
#[derive(Debug)]
pub enum NodeKind {
    /// Plays an [`AudioBuffer`](crate::AudioBuffer). Exactly one per graph.
    Source(SourceNode),
    /// Multiplies its single input by a scalar.
    Gain(GainNode),
    /// Convolves its single input with an impulse response.
    Convolver(ConvolverNode),
    /// Sums N inputs, each scaled by the weight of its edge.
    Sum,
    /// Terminal sink: the graph's output. Exactly one per graph.
    Destination,
}

impl NodeKind {
    /// Short lowercase name, used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Source(_) => "source",
            Self::Gain(_) => "gain",
            Self::Convolver(_) => "convolver",
            Self::Sum => "sum",
            Self::Destination => "destination",
        }
    }

    /// Maximum number of incoming edges this kind accepts.
    pub(crate) fn max_inputs(&self) -> usize {
        match self {
            Self::Source(_) => 0,
            Self::Gain(_) | Self::Convolver(_) | Self::Destination => 1,
            Self::Sum => usize::MAX,
        }
    }
}

/// Internal bookkeeping for a node in the graph.
#[derive(Debug)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    /// Edges arriving at this node.
    pub incoming: Vec<EdgeId>,
    /// Edges leaving this node.
    pub outgoing: Vec<EdgeId>,
}

impl NodeData {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }
}
