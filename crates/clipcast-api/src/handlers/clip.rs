//! Clip extraction handler.
//!
//! Coordinates the full pipeline for one request: validate query
//! parameters, materialize the source video locally, spawn the FFmpeg
//! stream-copy extraction, and pipe its stdout to the HTTP response with
//! temp-file cleanup guaranteed on every exit path.

use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::Response;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use clipcast_media::spawn_clip_stream;
use clipcast_models::{derive_clip_filename, ClipRequest, ClipSource, SourceKind};

use crate::error::{ApiError, ApiResult};
use crate::materialize::materialize;
use crate::state::AppState;
use crate::stream::StreamCleanup;

/// Response header carrying the suggested clip filename.
///
/// The body is an unnamed byte stream, so this is the only way a browser
/// client can recover a human-readable name.
pub const CLIP_FILENAME_HEADER: &str = "x-clip-filename";

/// Query parameters for `GET /api/clip-video`.
///
/// Offsets arrive as strings so malformed numbers produce the same JSON
/// error shape as every other validation failure.
#[derive(Debug, Deserialize)]
pub struct ClipQuery {
    pub identifier: Option<String>,
    #[serde(rename = "sourceType")]
    pub source_type: Option<String>,
    #[serde(rename = "startTime")]
    pub start_time: Option<String>,
    #[serde(rename = "endTime")]
    pub end_time: Option<String>,
    #[serde(rename = "inputFileName")]
    pub input_file_name: Option<String>,
}

/// Resolve the source descriptor from the query.
///
/// `inputFileName` takes precedence when both it and
/// `identifier`+`sourceType` are supplied.
pub(crate) fn resolve_source(
    input_file_name: Option<&str>,
    identifier: Option<&str>,
    source_type: Option<&str>,
) -> ApiResult<ClipSource> {
    if let Some(name) = input_file_name.filter(|s| !s.trim().is_empty()) {
        return Ok(ClipSource::local_file(name));
    }

    match (identifier, source_type) {
        (Some(id), Some(kind_str)) => {
            let kind = SourceKind::from_query(kind_str)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown sourceType: {}", kind_str)))?;
            Ok(match kind {
                SourceKind::CloudObject => ClipSource::cloud_object(id),
                _ => ClipSource::remote_url(id),
            })
        }
        _ => Err(ApiError::bad_request(
            "Provide inputFileName, or identifier together with sourceType",
        )),
    }
}

fn parse_offset(value: Option<&str>, name: &str) -> ApiResult<f64> {
    let raw = value
        .ok_or_else(|| ApiError::bad_request(format!("Missing required parameter: {}", name)))?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ApiError::bad_request(format!("Invalid {}: {}", name, raw)))
}

/// Extract a clip and stream it as MP4.
///
/// GET /api/clip-video?identifier=...&sourceType=...&startTime=...&endTime=...&inputFileName=...
///
/// Success: 200, `Content-Type: video/mp4`, `X-Clip-Filename` header, body
/// = fragmented MP4 byte stream. Failure before streaming: 400/404/500 with
/// `{ "error": ... }`. Failure after streaming began: connection closed.
pub async fn clip_video(
    State(state): State<AppState>,
    Query(query): Query<ClipQuery>,
) -> ApiResult<Response> {
    // Validation happens in full before any I/O.
    let source = resolve_source(
        query.input_file_name.as_deref(),
        query.identifier.as_deref(),
        query.source_type.as_deref(),
    )?;
    let start = parse_offset(query.start_time.as_deref(), "startTime")?;
    let end = parse_offset(query.end_time.as_deref(), "endTime")?;
    let request =
        ClipRequest::new(source, start, end).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let filename = derive_clip_filename(&request.source, request.start_secs, request.end_secs);

    let mut source_file = materialize(&state, &request.source).await?;

    let mut process = match spawn_clip_stream(
        source_file.path(),
        request.start_secs,
        request.end_secs,
    ) {
        Ok(p) => p,
        Err(e) => {
            source_file.cleanup().await;
            return Err(e.into());
        }
    };

    let mut stdout = match process.take_stdout() {
        Ok(s) => s,
        Err(e) => {
            source_file.cleanup().await;
            return Err(e.into());
        }
    };

    // Read the first chunk before committing to headers, so an FFmpeg run
    // that fails immediately still surfaces as a JSON error instead of an
    // empty 200.
    let mut first = vec![0u8; 64 * 1024];
    let n = match stdout.read(&mut first).await {
        Ok(n) => n,
        Err(e) => {
            source_file.cleanup().await;
            return Err(ApiError::Extraction(e.to_string()));
        }
    };
    if n == 0 {
        let err = match process.finish().await {
            Ok(()) => ApiError::Extraction("FFmpeg produced no output".to_string()),
            Err(e) => e.into(),
        };
        source_file.cleanup().await;
        return Err(err);
    }
    first.truncate(n);

    // Drain stderr for the rest of the run so FFmpeg never blocks on a
    // full pipe; whatever it printed is logged when the child exits.
    if let Some(mut stderr) = process.take_stderr() {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            if !buf.is_empty() {
                let text = String::from_utf8_lossy(&buf);
                warn!(
                    stderr = %text.lines().last().unwrap_or(""),
                    "FFmpeg reported errors while streaming"
                );
            }
        });
    }

    info!(
        filename = %filename,
        start = request.start_secs,
        end = request.end_secs,
        "Streaming clip"
    );

    // Ownership of the temp source transfers to the stream guard; from here
    // cleanup runs when the body is dropped, on every outcome.
    let guard = StreamCleanup::new(Some(process), source_file.into_cleanup_path());

    let head = futures_util::stream::once(async move { Ok::<_, std::io::Error>(Bytes::from(first)) });
    let tail = ReaderStream::new(stdout);
    let stream = head.chain(tail).map(move |chunk| {
        let _cleanup = &guard;
        chunk
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(CLIP_FILENAME_HEADER, &filename)
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipcast_models::SourceKind;

    #[test]
    fn test_resolve_source_prefers_input_file_name() {
        let source = resolve_source(
            Some("talk.mp4"),
            Some("https://example.com/other.mp4"),
            Some("external_url"),
        )
        .unwrap();
        assert_eq!(source.kind, SourceKind::LocalFile);
        assert_eq!(source.identifier, "talk.mp4");
    }

    #[test]
    fn test_resolve_source_identifier_pair() {
        let source = resolve_source(None, Some("uploads/talk.mp4"), Some("supabase")).unwrap();
        assert_eq!(source.kind, SourceKind::CloudObject);

        let source =
            resolve_source(None, Some("https://example.com/v.mp4"), Some("external_url")).unwrap();
        assert_eq!(source.kind, SourceKind::RemoteUrl);
    }

    #[test]
    fn test_resolve_source_missing_everything() {
        assert!(resolve_source(None, None, None).is_err());
        assert!(resolve_source(None, Some("id"), None).is_err());
        assert!(resolve_source(None, None, Some("supabase")).is_err());
    }

    #[test]
    fn test_resolve_source_unknown_kind() {
        let err = resolve_source(None, Some("id"), Some("ftp")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_parse_offset() {
        assert!((parse_offset(Some("12.5"), "startTime").unwrap() - 12.5).abs() < 1e-9);
        assert!(parse_offset(Some("abc"), "startTime").is_err());
        assert!(parse_offset(None, "startTime").is_err());
    }
}
