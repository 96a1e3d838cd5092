use thiserror::Error;
use upform_core::IngestError;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create scratch directory: {0}")]
    CreateFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Promote failed: {0}")]
    PromoteFailed(String),

    #[error("Invalid storage name: {0}")]
    InvalidKey(String),

    #[error("Session is no longer open")]
    SessionClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for IngestError {
    fn from(err: StorageError) -> Self {
        IngestError::Storage(err.to_string())
    }
}
