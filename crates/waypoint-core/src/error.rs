use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("short code already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}
