//! Graph edge types.
//!
//! An `Edge` carries audio from one node to another. Edges into a
//! [`Sum`](super::NodeKind::Sum) node carry a mixing weight; every other node
//! ignores it.

use super::node::NodeId;

/// Unique identifier for an edge in an audio graph.
///
/// Edge IDs are assigned sequentially and never reused within a graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// A directed, weighted connection between two nodes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    /// Mixing weight applied by a Sum destination.
    pub weight: f32,
}
