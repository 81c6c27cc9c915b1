//! Storage error types.

use thiserror::Error;

/// Errors from storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested key or row was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A storage operation failed for a reason not covered below.
    #[error("storage error: {0}")]
    Internal(String),

    /// Connection to the storage backend failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The namespace or key is invalid (empty, or contains a null byte).
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for wov_core::WovError {
    fn from(e: StorageError) -> Self {
        wov_core::WovError::Internal(e.to_string())
    }
}
