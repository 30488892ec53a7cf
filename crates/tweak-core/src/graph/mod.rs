//! Audio node graph.
//!
//! Processing is modelled as a directed acyclic graph: a single
//! [`SourceNode`] playing an [`AudioBuffer`](crate::AudioBuffer) feeds gain,
//! convolver and sum nodes that end in a single destination. The graph is
//! edited through [`AudioGraph`] and compiled into a [`CompiledGraph`], which
//! processes fixed-size blocks without allocating.
//!
//! # Two-object split
//!
//! - [`AudioGraph`] holds topology and runs validation. Cycles are rejected at
//!   [`connect()`](AudioGraph::connect) time; missing endpoints and dangling
//!   nodes are rejected at [`compile()`](AudioGraph::compile) time.
//! - [`CompiledGraph`] owns the nodes in topological order plus one output
//!   buffer per node. It is `Send`, so the live session can move it onto the
//!   audio thread.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tweak_core::AudioBuffer;
//! use tweak_core::graph::AudioGraph;
//!
//! let buffer = Arc::new(AudioBuffer::mono(vec![0.25; 1024], 48000)?);
//! let mut graph = AudioGraph::new(1, 48000);
//! let src = graph.add_buffer_source(buffer, 0.0)?;
//! let gain = graph.add_gain(2.0);
//! let dest = graph.add_destination()?;
//! graph.connect(src, gain)?;
//! graph.connect(gain, dest)?;
//!
//! let mut compiled = graph.compile(256)?;
//! let frames = compiled.process_block();
//! assert_eq!(frames, 256);
//! assert_eq!(compiled.output()[0][0], 0.5);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod compiled;
pub mod convolver;
pub mod edge;
pub mod node;
mod processing;
pub mod source;

pub use compiled::CompiledGraph;
pub use convolver::{ConvolverNode, PartitionedConvolver};
pub use edge::EdgeId;
pub use node::{GainNode, NodeId, NodeKind};
pub use processing::{AudioGraph, GraphError};
pub use source::{SourceNode, effective_rate};
