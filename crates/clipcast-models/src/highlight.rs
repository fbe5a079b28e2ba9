//! Highlight (candidate clip) models.

use serde::{Deserialize, Serialize};

use crate::timestamp::parse_timestamp;

/// Hook category for a highlight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightCategory {
    Emotional,
    Educational,
    Controversial,
    Inspirational,
    Humorous,
    Dramatic,
    Surprising,
    #[serde(other)]
    Other,
}

/// A candidate highlight segment identified by the AI analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    /// Unique ID within the video (1-indexed)
    pub id: u32,

    /// Scene title
    pub title: String,

    /// Start timestamp (HH:MM:SS or HH:MM:SS.mmm)
    pub start: String,

    /// End timestamp (HH:MM:SS or HH:MM:SS.mmm)
    pub end: String,

    /// Duration in seconds
    #[serde(default)]
    pub duration: u32,

    /// Hook category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_category: Option<HighlightCategory>,

    /// Reason why this is a good clip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Social media caption for the scene
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Highlight {
    /// Shape-check a deserialized highlight.
    ///
    /// The AI response is loosely specified, so element shape is never
    /// trusted: the title must be non-empty and the timestamps must parse
    /// with `start < end`.
    pub fn is_valid(&self) -> bool {
        if self.title.trim().is_empty() {
            return false;
        }
        match (parse_timestamp(&self.start), parse_timestamp(&self.end)) {
            (Ok(start), Ok(end)) => start < end,
            _ => false,
        }
    }

    /// Recompute `duration` from the start/end timestamps.
    pub fn with_calculated_duration(mut self) -> Self {
        if let (Ok(start_secs), Ok(end_secs)) =
            (parse_timestamp(&self.start), parse_timestamp(&self.end))
        {
            self.duration = (end_secs - start_secs).max(0.0) as u32;
        }
        self
    }
}

/// The full highlight set returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightsData {
    /// List of highlights
    pub highlights: Vec<Highlight>,

    /// Video URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Video title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_title: Option<String>,
}
