//! Audio graph: mutation API, cycle detection, and compilation.
//!
//! [`AudioGraph`] owns the topology. Nodes are added and connected while the
//! graph is being built; [`compile()`](AudioGraph::compile) then validates the
//! shape, sorts it topologically and hands the nodes to a [`CompiledGraph`]
//! that does the per-block work.

use std::sync::Arc;

use crate::buffer::AudioBuffer;
use crate::impulse::ImpulseResponse;

use super::compiled::{CompiledGraph, Step};
use super::convolver::ConvolverNode;
use super::edge::{Edge, EdgeId};
use super::node::{GainNode, NodeData, NodeId, NodeKind};
use super::source::SourceNode;

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The specified node was not found in the graph.
    NodeNotFound(NodeId),
    /// Adding this edge would create a cycle.
    CycleDetected,
    /// The graph must have exactly one Source node.
    InvalidSourceCount(usize),
    /// The graph must have exactly one Destination node.
    InvalidDestinationCount(usize),
    /// A node has an invalid connection (e.g., an edge into the Source).
    InvalidConnection(String),
    /// A node is not connected on a side where it must be.
    Unconnected(NodeId),
    /// A duplicate edge already exists between these nodes.
    DuplicateEdge(NodeId, NodeId),
    /// Compilation requires a non-zero block size.
    InvalidBlockSize(usize),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node {id} not found"),
            Self::CycleDetected => write!(f, "adding this edge would create a cycle"),
            Self::InvalidSourceCount(n) => write!(f, "expected 1 source node, found {n}"),
            Self::InvalidDestinationCount(n) => {
                write!(f, "expected 1 destination node, found {n}")
            }
            Self::InvalidConnection(msg) => write!(f, "invalid connection: {msg}"),
            Self::Unconnected(id) => write!(f, "node {id} is not connected"),
            Self::DuplicateEdge(a, b) => write!(f, "edge from {a} to {b} already exists"),
            Self::InvalidBlockSize(n) => write!(f, "invalid block size {n}"),
        }
    }
}

impl std::error::Error for GraphError {}

/// Directed acyclic graph of audio nodes.
///
/// # Usage
///
/// 1. Create a graph with [`new()`](Self::new)
/// 2. Add nodes: [`add_source()`](Self::add_source), [`add_gain()`](Self::add_gain),
///    [`add_convolver()`](Self::add_convolver), [`add_sum()`](Self::add_sum),
///    [`add_destination()`](Self::add_destination)
/// 3. Connect nodes: [`connect()`](Self::connect) or
///    [`connect_weighted()`](Self::connect_weighted)
/// 4. Compile: [`compile()`](Self::compile)
#[derive(Debug)]
pub struct AudioGraph {
    nodes: Vec<NodeData>,
    edges: Vec<Edge>,
    channel_count: usize,
    sample_rate: u32,
}

impl AudioGraph {
    /// Creates an empty graph carrying `channel_count` channels at `sample_rate`.
    pub fn new(channel_count: usize, sample_rate: u32) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            channel_count,
            sample_rate,
        }
    }

    // --- Node mutations ---

    /// Adds the source node.
    ///
    /// A graph has exactly one source; a second call fails.
    pub fn add_source(&mut self, source: SourceNode) -> Result<NodeId, GraphError> {
        if let Some(existing) = self.source_id() {
            return Err(GraphError::InvalidConnection(format!(
                "graph already has source {existing}"
            )));
        }
        Ok(self.add_node(NodeKind::Source(source)))
    }

    /// Convenience for [`add_source()`](Self::add_source) from a buffer and offset.
    pub fn add_buffer_source(
        &mut self,
        buffer: Arc<AudioBuffer>,
        start_secs: f64,
    ) -> Result<NodeId, GraphError> {
        self.add_source(SourceNode::new(buffer, start_secs))
    }

    /// Adds a gain node.
    pub fn add_gain(&mut self, gain: f32) -> NodeId {
        self.add_node(NodeKind::Gain(GainNode::new(gain)))
    }

    /// Adds a normalizing convolver node.
    pub fn add_convolver(&mut self, impulse: ImpulseResponse) -> NodeId {
        self.add_node(NodeKind::Convolver(ConvolverNode::new(impulse)))
    }

    /// Adds a sum (fan-in) node.
    pub fn add_sum(&mut self) -> NodeId {
        self.add_node(NodeKind::Sum)
    }

    /// Adds the destination node.
    ///
    /// A graph has exactly one destination; a second call fails.
    pub fn add_destination(&mut self) -> Result<NodeId, GraphError> {
        if let Some(existing) = self.destination_id() {
            return Err(GraphError::InvalidConnection(format!(
                "graph already has destination {existing}"
            )));
        }
        Ok(self.add_node(NodeKind::Destination))
    }

    /// Connects two nodes with a unit-weight edge.
    ///
    /// Returns the new edge's ID, or an error if:
    /// - Either node doesn't exist
    /// - The edge would create a cycle
    /// - A duplicate edge already exists
    /// - The connection is structurally invalid (e.g., edge into the Source)
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<EdgeId, GraphError> {
        self.connect_weighted(from, to, 1.0)
    }

    /// Connects two nodes. `weight` scales the signal when `to` is a Sum node.
    pub fn connect_weighted(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f32,
    ) -> Result<EdgeId, GraphError> {
        self.validate_connection(from, to)?;

        if self.find_edge(from, to).is_some() {
            return Err(GraphError::DuplicateEdge(from, to));
        }

        // A cycle exists if `to` can already reach `from`.
        if self.can_reach(to, from) {
            return Err(GraphError::CycleDetected);
        }

        let edge_id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge { from, to, weight });
        self.nodes[from.0 as usize].outgoing.push(edge_id);
        self.nodes[to.0 as usize].incoming.push(edge_id);

        #[cfg(feature = "tracing")]
        tracing::trace!("graph_connect: {from} -> {to} (weight={weight})");
        Ok(edge_id)
    }

    // --- Queries ---

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Channels every node carries.
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Sample rate of the graph.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The kind of node `id`.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0 as usize).map(|n| &n.kind)
    }

    /// ID of the source node, if one was added.
    pub fn source_id(&self) -> Option<NodeId> {
        self.position(|k| matches!(k, NodeKind::Source(_)))
    }

    /// ID of the destination node, if one was added.
    pub fn destination_id(&self) -> Option<NodeId> {
        self.position(|k| matches!(k, NodeKind::Destination))
    }

    /// Shared access to the source node.
    pub fn source(&self) -> Option<&SourceNode> {
        self.nodes.iter().find_map(|n| match &n.kind {
            NodeKind::Source(s) => Some(s),
            _ => None,
        })
    }

    /// Mutable access to the source node.
    pub fn source_mut(&mut self) -> Option<&mut SourceNode> {
        self.nodes.iter_mut().find_map(|n| match &mut n.kind {
            NodeKind::Source(s) => Some(s),
            _ => None,
        })
    }

    /// Gain of node `id`, if it is a gain node.
    pub fn gain(&self, id: NodeId) -> Option<f32> {
        match self.kind(id)? {
            NodeKind::Gain(g) => Some(g.gain()),
            _ => None,
        }
    }

    /// Nodes `id` feeds into.
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(id.0 as usize)
            .map(|n| n.outgoing.iter().map(|e| self.edges[e.0 as usize].to).collect())
            .unwrap_or_default()
    }

    /// Nodes feeding into `id`, with their edge weights.
    pub fn predecessors(&self, id: NodeId) -> Vec<(NodeId, f32)> {
        self.nodes
            .get(id.0 as usize)
            .map(|n| {
                n.incoming
                    .iter()
                    .map(|e| {
                        let edge = &self.edges[e.0 as usize];
                        (edge.from, edge.weight)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Finds the edge from `from` to `to`, if any.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        let node = self.nodes.get(from.0 as usize)?;
        node.outgoing
            .iter()
            .copied()
            .find(|e| self.edges[e.0 as usize].to == to)
    }

    // --- Compilation ---

    /// Validates the graph and compiles it for `block_size`-frame blocks.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if:
    /// - `block_size` is zero
    /// - The graph doesn't have exactly one Source and one Destination
    /// - A node other than the Destination has no outgoing edge, or a node
    ///   other than the Source has no incoming edge
    /// - The graph contains a cycle
    pub fn compile(self, block_size: usize) -> Result<CompiledGraph, GraphError> {
        if block_size == 0 {
            return Err(GraphError::InvalidBlockSize(block_size));
        }
        let (sources, destinations) = self.count_endpoints();
        if sources != 1 {
            return Err(GraphError::InvalidSourceCount(sources));
        }
        if destinations != 1 {
            return Err(GraphError::InvalidDestinationCount(destinations));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            let needs_output = !matches!(node.kind, NodeKind::Destination);
            let needs_input = !matches!(node.kind, NodeKind::Source(_));
            if (needs_output && node.outgoing.is_empty())
                || (needs_input && node.incoming.is_empty())
            {
                return Err(GraphError::Unconnected(NodeId(idx as u32)));
            }
        }

        let sorted = self.kahn_sort()?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            nodes = sorted.len(),
            edges = self.edges.len(),
            block_size,
            "graph compiled"
        );

        let steps: Vec<Step> = sorted
            .iter()
            .map(|&idx| Step {
                node: idx,
                inputs: self.nodes[idx]
                    .incoming
                    .iter()
                    .map(|e| {
                        let edge = &self.edges[e.0 as usize];
                        (edge.from.0 as usize, edge.weight)
                    })
                    .collect(),
            })
            .collect();

        let channel_count = self.channel_count;
        let mut kinds: Vec<NodeKind> = self.nodes.into_iter().map(|n| n.kind).collect();
        for kind in &mut kinds {
            if let NodeKind::Convolver(conv) = kind {
                conv.prepare(channel_count, block_size);
            }
        }

        Ok(CompiledGraph::new(
            kinds,
            steps,
            block_size,
            channel_count,
            self.sample_rate,
        ))
    }

    // --- Internals ---

    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        #[cfg(feature = "tracing")]
        tracing::trace!("graph_add: {} node {id}", kind.name());
        self.nodes.push(NodeData::new(kind));
        id
    }

    fn get_node(&self, id: NodeId) -> Result<&NodeData, GraphError> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(GraphError::NodeNotFound(id))
    }

    fn position(&self, pred: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| pred(&n.kind))
            .map(|idx| NodeId(idx as u32))
    }

    fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            let idx = current.0 as usize;
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            for edge_id in &self.nodes[idx].outgoing {
                stack.push(self.edges[edge_id.0 as usize].to);
            }
        }
        false
    }

    fn validate_connection(&self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        let from_node = self.get_node(from)?;
        let to_node = self.get_node(to)?;

        if from == to {
            return Err(GraphError::CycleDetected);
        }
        if matches!(from_node.kind, NodeKind::Destination) {
            return Err(GraphError::InvalidConnection(format!(
                "cannot connect from destination {from} -> {to}"
            )));
        }
        if to_node.incoming.len() >= to_node.kind.max_inputs() {
            return Err(GraphError::InvalidConnection(format!(
                "{} node {to} accepts at most {} input(s)",
                to_node.kind.name(),
                to_node.kind.max_inputs()
            )));
        }
        Ok(())
    }

    fn count_endpoints(&self) -> (usize, usize) {
        let mut sources = 0;
        let mut destinations = 0;
        for node in &self.nodes {
            match node.kind {
                NodeKind::Source(_) => sources += 1,
                NodeKind::Destination => destinations += 1,
                _ => {}
            }
        }
        (sources, destinations)
    }

    /// Kahn's algorithm. Returns node indices in topological order.
    fn kahn_sort(&self) -> Result<Vec<usize>, GraphError> {
        let n = self.nodes.len();
        let mut in_degree: Vec<usize> = self.nodes.iter().map(|n| n.incoming.len()).collect();
        let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut sorted = Vec::with_capacity(n);

        while let Some(idx) = queue.pop() {
            sorted.push(idx);
            for edge_id in &self.nodes[idx].outgoing {
                let to = self.edges[edge_id.0 as usize].to.0 as usize;
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    queue.push(to);
                }
            }
        }

        if sorted.len() != n {
            return Err(GraphError::CycleDetected);
        }
        Ok(sorted)
    }
}
