//! Gemini AI client for highlight analysis.
//!
//! The model returns free-form JSON text: it may be wrapped in markdown
//! code fences, carry a top-level object or a bare array, and contain
//! elements of dubious shape. Everything here is parsed defensively.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use clipcast_models::{Highlight, HighlightsData};

use crate::error::{ApiError, ApiResult};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Models tried in order until one succeeds.
const MODELS: [&str; 3] = ["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

/// Gemini API client for highlight analysis.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "fileData", skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
}

#[derive(Debug, Serialize)]
struct FileData {
    #[serde(rename = "fileUri")]
    file_uri: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// Loose highlight payload as the model emits it.
#[derive(Debug, Deserialize)]
struct RawHighlights {
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    video_title: Option<String>,
    #[serde(default)]
    highlights: Vec<Highlight>,
}

impl GeminiClient {
    /// Create a new Gemini client from the environment.
    pub fn new() -> ApiResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ApiError::internal("GEMINI_API_KEY not configured"))?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        })
    }

    /// Create a client against a non-default endpoint.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    /// Analyze a video and return candidate highlight segments.
    ///
    /// Falls through the model list on per-model failures.
    pub async fn analyze_video(
        &self,
        video_url: &str,
        user_prompt: Option<&str>,
    ) -> ApiResult<HighlightsData> {
        let prompt = build_analysis_prompt(user_prompt);

        let mut last_error = None;

        for model in &MODELS {
            info!("Attempting Gemini API with model: {}", model);
            match self.call_gemini_api(model, &prompt, video_url).await {
                Ok(mut data) => {
                    if data.video_url.is_none() {
                        data.video_url = Some(video_url.to_string());
                    }
                    info!(
                        model = %model,
                        highlights = data.highlights.len(),
                        "Gemini analysis succeeded"
                    );
                    return Ok(data);
                }
                Err(e) => {
                    warn!("Failed with model {}: {:?}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ApiError::internal("All Gemini models failed. Please try again later.")))
    }

    async fn call_gemini_api(
        &self,
        model: &str,
        prompt: &str,
        video_url: &str,
    ) -> ApiResult<HighlightsData> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: None,
                        file_data: Some(FileData {
                            file_uri: video_url.to_string(),
                        }),
                    },
                    Part {
                        text: Some(prompt.to_string()),
                        file_data: None,
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::internal(format!("Gemini API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::internal(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ApiError::internal(format!("Failed to parse Gemini response: {}", e)))?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| ApiError::internal("No content in Gemini response"))?;

        parse_highlights(text)
    }
}

/// Strip markdown code fences the model sometimes wraps around JSON.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// Parse the model's highlight payload into validated descriptors.
///
/// Accepts either `{ "highlights": [...] }` or a bare array; elements that
/// fail the shape check (unparseable timestamps, end before start, empty
/// title) are dropped rather than failing the whole response.
pub fn parse_highlights(text: &str) -> ApiResult<HighlightsData> {
    let text = strip_code_fences(text);

    let raw: RawHighlights = match serde_json::from_str::<RawHighlights>(text) {
        Ok(raw) => raw,
        Err(_) => {
            let list: Vec<Highlight> = serde_json::from_str(text).map_err(|e| {
                ApiError::internal(format!("Failed to parse highlights JSON: {}", e))
            })?;
            RawHighlights {
                video_url: None,
                video_title: None,
                highlights: list,
            }
        }
    };

    let total = raw.highlights.len();
    let highlights: Vec<Highlight> = raw
        .highlights
        .into_iter()
        .filter(|h| h.is_valid())
        .map(|h| h.with_calculated_duration())
        .collect();

    if highlights.len() < total {
        warn!(
            dropped = total - highlights.len(),
            "Dropped malformed highlight entries"
        );
    }

    Ok(HighlightsData {
        highlights,
        video_url: raw.video_url,
        video_title: raw.video_title,
    })
}

/// Build the analysis prompt, appending any caller-supplied instructions.
pub fn build_analysis_prompt(user_prompt: Option<&str>) -> String {
    let mut prompt = String::from(
        r#"You are a viral video expert. Watch the provided video and identify the most engaging, clip-worthy moments.

For each moment provide:
- A catchy, attention-grabbing title
- Precise timestamps (start and end)
- A category (emotional, educational, controversial, inspirational, humorous, dramatic, surprising)
- A compelling reason why this moment stands out
- A social media caption with relevant hashtags

IMPORTANT: You must strictly follow this output format.
Return ONLY a single JSON object with this schema:
{
  "video_url": "URL",
  "video_title": "Video title",
  "highlights": [
    {
      "id": 1,
      "title": "Clip Title",
      "start": "HH:MM:SS",
      "end": "HH:MM:SS",
      "duration": 0,
      "hook_category": "category",
      "reason": "Why this works as a clip",
      "description": "Engaging social media caption with hashtags"
    }
  ]
}"#,
    );

    if let Some(extra) = user_prompt.filter(|p| !p.trim().is_empty()) {
        prompt.push_str("\n\nADDITIONAL USER INSTRUCTIONS:\n");
        prompt.push_str(extra);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[]\n```"), "[]");
    }

    #[test]
    fn test_parse_highlights_object() {
        let text = r#"{
            "video_title": "Talk",
            "highlights": [
                {"id": 1, "title": "Hook", "start": "00:00:10", "end": "00:00:25"},
                {"id": 2, "title": "Broken", "start": "00:00:30", "end": "00:00:20"}
            ]
        }"#;

        let data = parse_highlights(text).unwrap();
        assert_eq!(data.video_title.as_deref(), Some("Talk"));
        // The inverted entry is dropped, the valid one gets a duration
        assert_eq!(data.highlights.len(), 1);
        assert_eq!(data.highlights[0].duration, 15);
    }

    #[test]
    fn test_parse_highlights_bare_array() {
        let text = r#"```json
        [{"id": 1, "title": "Hook", "start": "00:00:00", "end": "00:00:05"}]
        ```"#;

        let data = parse_highlights(text).unwrap();
        assert_eq!(data.highlights.len(), 1);
    }

    #[test]
    fn test_parse_highlights_garbage() {
        assert!(parse_highlights("the model had a bad day").is_err());
    }

    #[test]
    fn test_build_analysis_prompt_appends_user_text() {
        let prompt = build_analysis_prompt(Some("Focus on the Q&A section"));
        assert!(prompt.contains("ADDITIONAL USER INSTRUCTIONS"));
        assert!(prompt.contains("Focus on the Q&A section"));

        let prompt = build_analysis_prompt(None);
        assert!(!prompt.contains("ADDITIONAL USER INSTRUCTIONS"));
    }

    #[tokio::test]
    async fn test_analyze_video_falls_back_across_models() {
        let server = MockServer::start().await;

        // First model always fails, the fallback succeeds
        Mock::given(method("POST"))
            .and(path_regex(r"/v1beta/models/gemini-2\.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(
                r"/v1beta/models/gemini-2\.5-flash-lite:generateContent",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [{
                            "text": "{\"highlights\":[{\"id\":1,\"title\":\"Hook\",\"start\":\"00:00:01\",\"end\":\"00:00:09\"}]}"
                        }]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url("test-key", server.uri());
        let data = client
            .analyze_video("https://example.com/v.mp4", None)
            .await
            .unwrap();

        assert_eq!(data.highlights.len(), 1);
        assert_eq!(data.video_url.as_deref(), Some("https://example.com/v.mp4"));
    }
}
