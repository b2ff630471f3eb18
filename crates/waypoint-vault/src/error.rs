use thiserror::Error;

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// The closed set of failures a vault operation can surface.
///
/// `CorruptState` is terminal: it means a restore failed *and* the
/// rollback copy-back failed, so the data file content is unknown. It
/// must never be collapsed into the ordinary `Backup` failure path.
#[derive(Debug, Clone, Error)]
pub enum VaultError {
    #[error("backup not found: {0}")]
    NotFound(String),
    #[error("snapshot store error: {0}")]
    Storage(String),
    #[error("backup operation failed: {0}")]
    Backup(String),
    #[error("data file state is unknown after a failed rollback: {0}")]
    CorruptState(String),
}
