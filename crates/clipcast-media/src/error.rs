//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while materializing or extracting video.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("FFmpeg failed to start: {message}")]
    ExtractionStartFailed { message: String },

    #[error("FFmpeg exited with non-zero status: {message}")]
    ExtractionFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Create a spawn failure error.
    pub fn extraction_start_failed(message: impl Into<String>) -> Self {
        Self::ExtractionStartFailed {
            message: message.into(),
        }
    }

    /// Create an extraction failure error.
    pub fn extraction_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ExtractionFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }
}
