//! Error types for query operations

use crate::error::AppError;

/// Result type for query operations
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Errors that can occur while composing or executing a hotfix query
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Caller supplied out-of-range paging input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stored record could not be evaluated; recovered by excluding the record
    #[error("Record {position} ({key:?}) cannot be evaluated: {reason}")]
    RecordFault {
        position: usize,
        key: String,
        reason: String,
    },

    /// List-field defaulting was needed before the first successful catalog load
    #[error("Distinct-value index is not ready; the catalog has not been loaded yet")]
    IndexNotReady,

    /// The record store could not be scanned
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidInput(msg) => AppError::InvalidInput(msg),
            QueryError::IndexNotReady => AppError::IndexNotReady,
            QueryError::StoreUnavailable(msg) => AppError::StoreUnavailable(msg),
            QueryError::RecordFault { .. } => AppError::Internal(err.to_string()),
        }
    }
}
