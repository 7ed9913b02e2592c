//! Error types for the workflow service

use thiserror::Error;

use node_engine::ValidationError;
use providers::ProviderError;
use skein_credit_ledger::CreditError;

/// Result type alias using WorkflowError
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors that refuse a run before any side effect
///
/// Node-level failures during a run do not surface here; they land on
/// the node's execution record and fail the run's [`RunResult`] instead,
/// preserving partial results.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The graph failed validation; nothing was executed or charged
    #[error("graph validation failed: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    /// A node references a type that was never registered
    #[error("node type '{0}' is not registered")]
    UnknownNodeType(String),

    /// A node referenced by the run selection does not exist
    #[error("node '{0}' not found in graph")]
    NodeNotFound(String),

    /// Provider-level failure surfaced outside a run
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Credit-level failure surfaced outside a run
    #[error(transparent)]
    Credit(#[from] CreditError),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_all() {
        let err = WorkflowError::Validation(vec![
            ValidationError::CycleDetected,
            ValidationError::UnknownNodeType {
                node_id: "a".into(),
                node_type: "mystery".into(),
            },
        ]);
        let message = err.to_string();
        assert!(message.contains("cycle"));
        assert!(message.contains("mystery"));
    }
}
