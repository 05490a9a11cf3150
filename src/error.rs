//! Failure taxonomy shared by the store and the HTTP access layer.

use thiserror::Error;

/// Errors surfaced by store operations and their HTTP wrappers.
///
/// Every failure a caller can observe collapses into one of these four
/// cases. Storage failures are reported as-is and the operation is
/// abandoned; nothing is retried or partially applied.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field is missing, empty, or outside its allowed set.
    #[error("validation failed: {0}")]
    Validation(String),
    /// The caller's role does not permit the operation.
    #[error("access denied")]
    Forbidden,
    /// The requested circular does not exist.
    #[error("circular not found")]
    NotFound,
    /// The underlying persistence layer failed.
    #[error("storage error: {0}")]
    Storage(anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Storage(err.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Storage(err.into())
    }
}

impl From<walkdir::Error> for StoreError {
    fn from(err: walkdir::Error) -> Self {
        StoreError::Storage(err.into())
    }
}

impl From<tempfile::PersistError> for StoreError {
    fn from(err: tempfile::PersistError) -> Self {
        StoreError::Storage(err.into())
    }
}
