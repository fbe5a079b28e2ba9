//! Highlight analysis handlers.
//!
//! Both endpoints resolve the video to a URL Gemini can fetch and return
//! the validated highlight list as JSON. Storage objects are signed first
//! so the model can read them without credentials.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use clipcast_models::{HighlightsData, SourceKind};

use crate::error::{ApiError, ApiResult};
use crate::services::GeminiClient;
use crate::state::AppState;

/// Request body for `POST /api/analyze-video`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeVideoRequest {
    pub identifier: Option<String>,
    #[serde(rename = "sourceType")]
    pub source_type: Option<String>,
    pub prompt: Option<String>,
}

/// Request body for `POST /api/analyze-url`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeUrlRequest {
    pub url: Option<String>,
    pub prompt: Option<String>,
}

fn require_http_url(raw: &str) -> ApiResult<&str> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(ApiError::bad_request("Missing required parameter: url"));
    }
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(url),
        _ => Err(ApiError::bad_request(format!("Invalid URL: {}", url))),
    }
}

/// Analyze a stored or external video for highlights.
///
/// POST /api/analyze-video
pub async fn analyze_video(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeVideoRequest>,
) -> ApiResult<Json<HighlightsData>> {
    let identifier = body
        .identifier
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required parameter: identifier"))?;
    let kind_str = body
        .source_type
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("Missing required parameter: sourceType"))?;
    let kind = SourceKind::from_query(kind_str)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown sourceType: {}", kind_str)))?;

    let video_url = match kind {
        SourceKind::CloudObject => {
            state
                .storage
                .create_signed_url(identifier, state.config.signed_url_ttl)
                .await?
        }
        SourceKind::RemoteUrl => require_http_url(identifier)?.to_string(),
        SourceKind::LocalFile => {
            return Err(ApiError::bad_request(
                "Analysis requires a supabase or external_url source",
            ))
        }
    };

    info!(source_type = %kind_str, "Starting video analysis");

    let gemini = GeminiClient::new()?;
    let data = gemini
        .analyze_video(&video_url, body.prompt.as_deref())
        .await?;

    Ok(Json(data))
}

/// Analyze an arbitrary video URL for highlights.
///
/// POST /api/analyze-url
pub async fn analyze_url(
    Json(body): Json<AnalyzeUrlRequest>,
) -> ApiResult<Json<HighlightsData>> {
    // Validate before touching credentials so a bad URL is a 400, not a
    // missing-key 500.
    let url = require_http_url(body.url.as_deref().unwrap_or_default())?.to_string();

    info!(url = %url, "Starting URL analysis");

    let gemini = GeminiClient::new()?;
    let data = gemini.analyze_video(&url, body.prompt.as_deref()).await?;

    Ok(Json(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_http_url() {
        assert!(require_http_url("https://example.com/v.mp4").is_ok());
        assert!(require_http_url("http://example.com/v.mp4").is_ok());
        assert!(require_http_url("ftp://example.com/v.mp4").is_err());
        assert!(require_http_url("not a url").is_err());
        assert!(require_http_url("").is_err());
    }
}
