//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use clipcast_media::MediaError;
use clipcast_storage::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure taxonomy surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Signed URL error: {0}")]
    SignedUrl(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Extraction failed to start: {0}")]
    ExtractionStart(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::SignedUrl(_)
            | ApiError::Download(_)
            | ApiError::ExtractionStart(_)
            | ApiError::Extraction(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::FileNotFound(path) => {
                ApiError::NotFound(format!("File not found: {}", path.display()))
            }
            MediaError::DownloadFailed { message } => ApiError::Download(message),
            MediaError::YtDlpNotFound => ApiError::Download(e.to_string()),
            MediaError::FfmpegNotFound => ApiError::ExtractionStart(e.to_string()),
            MediaError::ExtractionStartFailed { message } => ApiError::ExtractionStart(message),
            MediaError::ExtractionFailed { message, .. } => ApiError::Extraction(message),
            MediaError::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(key) => ApiError::NotFound(format!("Object not found: {}", key)),
            StorageError::SignedUrl(msg) => ApiError::SignedUrl(msg),
            StorageError::DownloadFailed(msg) => ApiError::Download(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let error = if status == StatusCode::INTERNAL_SERVER_ERROR
            && std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
        {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse { error };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Download("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::ExtractionStart("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_media_error_conversion() {
        let e: ApiError = MediaError::download_failed("no route").into();
        assert!(matches!(e, ApiError::Download(_)));

        let e: ApiError = MediaError::extraction_start_failed("missing binary").into();
        assert!(matches!(e, ApiError::ExtractionStart(_)));
    }

    #[test]
    fn test_storage_error_conversion() {
        let e: ApiError = StorageError::not_found("key").into();
        assert!(matches!(e, ApiError::NotFound(_)));

        let e: ApiError = StorageError::signed_url("denied").into();
        assert!(matches!(e, ApiError::SignedUrl(_)));
    }
}
