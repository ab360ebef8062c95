//! Error types for QSTATE

use crate::types::StateKind;
use thiserror::Error;

/// Main error type for QSTATE
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    // ============ Configuration Errors ============
    #[error("Serializer of state '{state}' is not initialized")]
    UninitializedSerializer { state: String },

    #[error("Configuration error: {0}")]
    Config(String),

    // ============ Snapshot Errors ============
    #[error("Snapshot deserialization failed: {0}")]
    Deserialization(#[from] DeserializationError),

    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),

    // ============ Misuse Errors ============
    #[error("Unsupported operation '{operation}' on immutable {kind} state")]
    UnsupportedMutation {
        kind: StateKind,
        operation: &'static str,
    },
}

impl StateError {
    /// True for every failure a retried fetch could cure.
    pub fn is_snapshot_error(&self) -> bool {
        matches!(self, StateError::Deserialization(_))
    }
}

/// Reason a snapshot buffer could not be turned back into a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeserializationError {
    /// The buffer ended before the value was complete
    #[error("truncated snapshot: {0}")]
    Truncated(String),

    /// The bytes present do not form a valid encoding
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),

    /// Bytes were left over after the value and the policy rejects them
    #[error("{remaining} unconsumed bytes after the decoded value")]
    TrailingBytes { remaining: usize },
}

impl From<bincode::Error> for StateError {
    fn from(err: bincode::Error) -> Self {
        StateError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_mutation_message() {
        let err = StateError::UnsupportedMutation {
            kind: StateKind::Aggregating,
            operation: "add",
        };
        assert_eq!(
            err.to_string(),
            "Unsupported operation 'add' on immutable aggregating state"
        );
    }

    #[test]
    fn test_deserialization_error_is_snapshot_error() {
        let err: StateError = DeserializationError::Truncated("eof".into()).into();
        assert!(err.is_snapshot_error());

        let err = StateError::UninitializedSerializer {
            state: "counts".into(),
        };
        assert!(!err.is_snapshot_error());
    }
}
