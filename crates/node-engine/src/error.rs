//! Error types for the node engine

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias using NodeEngineError
pub type Result<T> = std::result::Result<T, NodeEngineError>;

/// Errors that can occur in the node engine
#[derive(Debug, Error)]
pub enum NodeEngineError {
    /// Graph failed validation
    #[error("graph validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A node type was referenced but never registered
    #[error("node type '{0}' is not registered")]
    UnknownNodeType(String),

    /// A node referenced by ID does not exist in the graph
    #[error("node '{0}' not found in graph")]
    NodeNotFound(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NodeEngineError {
    /// Create an unknown-node-type error
    pub fn unknown_type(node_type: impl Into<String>) -> Self {
        Self::UnknownNodeType(node_type.into())
    }
}
