//! Error types for graph construction and rendering.

use crate::graph::GraphError;

/// Errors produced by the tweak core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed buffer, or a parameter outside its documented domain.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The node graph rejected a mutation or failed to compile.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// An offline render failed. Wraps the error that aborted it.
    #[error("render failed: {source}")]
    Render {
        /// The failure that aborted the render.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Wraps `self` as the cause of a failed render.
    pub fn into_render(self) -> Self {
        match self {
            Self::Render { .. } => self,
            other => Self::Render {
                source: Box::new(other),
            },
        }
    }

    /// Returns true if this error, or the error it wraps, is [`Error::InvalidInput`].
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::InvalidInput(_) => true,
            Self::Render { source } => source.is_invalid_input(),
            Self::Graph(_) => false,
        }
    }
}

/// Convenience result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
