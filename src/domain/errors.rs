//! Domain errors for the levelup gamification core.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur while recording progress.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The persistent store could not be reached or rejected the operation.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// An optimistic transaction kept losing the race for its document.
    #[error("Transaction on {document} gave up after {attempts} conflicting attempts")]
    TransactionConflictExhausted { document: String, attempts: u32 },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The document version moved between read and write. Retryable.
    #[error("Concurrency conflict: {entity} {id} was modified")]
    ConcurrencyConflict { entity: String, id: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Whether the error came from the optimistic version check.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }

    /// Whether the error names a missing user or task.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TaskNotFound(_) | Self::UserNotFound(_))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_classification() {
        let err = DomainError::ConcurrencyConflict {
            entity: "streak".to_string(),
            id: "u1".to_string(),
        };
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
        assert!(DomainError::TaskNotFound(Uuid::nil()).is_not_found());
    }

    #[test]
    fn test_sqlx_errors_map_to_store_unavailable() {
        let err: DomainError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DomainError::StoreUnavailable(_)));
    }
}
