//! Error types for the evaluation domain.
//!
//! `ValidationError` is raised by entity construction, `StoreError` by any
//! persistence gateway, and `RepositoryError` is what repository callers see.

use thiserror::Error;

/// A field constraint violated while constructing an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// Name of the offending field (e.g. "duration_minutes").
    pub field: &'static str,
    /// Human-readable constraint that was violated.
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors reported by a persistence gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or opened.
    #[error("store unreachable: {0}")]
    Connection(String),

    /// A statement failed inside an open transaction.
    #[error("{operation} failed: {message}")]
    Operation {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn operation(operation: &'static str, message: impl Into<String>) -> Self {
        StoreError::Operation {
            operation,
            message: message.into(),
        }
    }
}

/// Errors returned by `EvaluationRepository` operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The evaluation failed a field constraint.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another evaluation already uses this name.
    #[error("an evaluation named '{0}' already exists")]
    DuplicateName(String),

    /// Another assignment already uses this topic.
    #[error("an assignment with topic '{0}' already exists")]
    DuplicateTopic(String),

    /// No evaluation with this name exists.
    #[error("evaluation '{0}' not found")]
    NotFound(String),

    /// The store is not reachable; mutations are rejected.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store failed mid-transaction; the transaction was rolled back.
    #[error("store operation failed: {0}")]
    StoreOperation(#[source] StoreError),
}

impl RepositoryError {
    /// Returns `true` for failures caused by the store rather than the data.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            RepositoryError::StoreUnavailable(_) | RepositoryError::StoreOperation(_)
        )
    }
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection(message) => RepositoryError::StoreUnavailable(message),
            other => RepositoryError::StoreOperation(other),
        }
    }
}

/// Errors converting an import record into an evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    /// The date is not an ISO-8601 calendar date.
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The kind tag is not one of the known kinds.
    #[error("unknown evaluation kind '{0}'")]
    UnknownKind(String),

    /// The record's fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
