//! Original (untrimmed) video download handler.
//!
//! Storage objects and plain URLs are answered with a redirect; streaming
//! platforms require a yt-dlp download first and are then streamed from the
//! temp file, which is deleted once the response body is dropped.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::info;

use clipcast_media::{download_with_ytdlp, is_streaming_url};
use clipcast_models::{sanitize_filename, ClipSource, SourceKind};

use crate::error::{ApiError, ApiResult};
use crate::handlers::clip::resolve_source;
use crate::materialize::materialize;
use crate::state::AppState;
use crate::stream::StreamCleanup;

/// Query parameters for `GET /api/download-video`.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub identifier: Option<String>,
    #[serde(rename = "sourceType")]
    pub source_type: Option<String>,
    #[serde(rename = "inputFileName")]
    pub input_file_name: Option<String>,
}

/// Suggested download name for a source.
fn download_filename(source: &ClipSource) -> String {
    let raw = source
        .identifier
        .split(['?', '#'])
        .next()
        .unwrap_or("")
        .rsplit('/')
        .next()
        .unwrap_or("");
    let name = sanitize_filename(raw);

    if name.is_empty() {
        "video.mp4".to_string()
    } else if name.contains('.') {
        name
    } else {
        format!("{}.mp4", name)
    }
}

fn redirect_to(url: String) -> ApiResult<Response> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, url)
        // Prevent caching so expired signed URLs are not replayed
        .header(header::CACHE_CONTROL, "private, max-age=60")
        .body(Body::empty())
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

/// Stream a local file, deleting it afterwards when `temporary` is set.
async fn stream_file(
    path: std::path::PathBuf,
    filename: &str,
    temporary: bool,
) -> ApiResult<Response> {
    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::not_found(format!("File not found: {}", filename))
        } else {
            ApiError::internal(e.to_string())
        }
    })?;

    let guard = StreamCleanup::new(None, temporary.then(|| path.clone()));
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _cleanup = &guard;
        chunk
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

/// Download or redirect to the original video.
///
/// GET /api/download-video?identifier=...&sourceType=...&inputFileName=...
pub async fn download_video(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let source = resolve_source(
        query.input_file_name.as_deref(),
        query.identifier.as_deref(),
        query.source_type.as_deref(),
    )?;
    let filename = download_filename(&source);

    match source.kind {
        SourceKind::CloudObject => {
            let signed = state
                .storage
                .create_signed_url(&source.identifier, state.config.signed_url_ttl)
                .await?;
            info!(key = %source.identifier, "Redirecting to signed URL");
            redirect_to(signed)
        }

        SourceKind::RemoteUrl if is_streaming_url(&source.identifier) => {
            let path = download_with_ytdlp(&source.identifier, &state.config.temp_dir).await?;
            info!(url = %source.identifier, "Streaming downloaded video");
            stream_file(path, &filename, true).await
        }

        SourceKind::RemoteUrl => {
            info!(url = %source.identifier, "Redirecting to source URL");
            redirect_to(source.identifier.clone())
        }

        SourceKind::LocalFile => {
            let materialized = materialize(&state, &source).await?;
            stream_file(materialized.path().to_path_buf(), &filename, false).await
        }
    }
}
