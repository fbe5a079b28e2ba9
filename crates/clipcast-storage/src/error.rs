//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors returned by the Supabase Storage client.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Signed URL request failed: {0}")]
    SignedUrl(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Create a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    /// Create a signed-URL error.
    pub fn signed_url(message: impl Into<String>) -> Self {
        Self::SignedUrl(message.into())
    }

    /// Create an upload failure error.
    pub fn upload_failed(message: impl Into<String>) -> Self {
        Self::UploadFailed(message.into())
    }
}
