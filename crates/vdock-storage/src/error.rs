//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by the object store client.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Missing or unusable client configuration.
    #[error("Storage configuration error: {0}")]
    ConfigError(String),

    /// A put could not be completed.
    #[error("Object upload failed: {0}")]
    UploadFailed(String),

    /// Any other S3 API failure, e.g. the readiness head-bucket call.
    #[error("S3 request failed: {0}")]
    S3Api(String),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }
}
