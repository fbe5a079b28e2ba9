//! Clip extraction request models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the source video lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A file already present under the mounted downloads directory.
    LocalFile,
    /// An arbitrary remote URL (streaming platform or direct link).
    RemoteUrl,
    /// An object key in the storage bucket.
    CloudObject,
}

impl SourceKind {
    /// Parse the wire value used by the `sourceType` query parameter.
    pub fn from_query(value: &str) -> Option<Self> {
        match value {
            "external_url" => Some(Self::RemoteUrl),
            "supabase" => Some(Self::CloudObject),
            _ => None,
        }
    }
}

/// A resolved source descriptor: kind plus the identifier it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipSource {
    pub kind: SourceKind,
    /// File name, URL, or storage key depending on `kind`.
    pub identifier: String,
}

impl ClipSource {
    pub fn local_file(name: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::LocalFile,
            identifier: name.into(),
        }
    }

    pub fn remote_url(url: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::RemoteUrl,
            identifier: url.into(),
        }
    }

    pub fn cloud_object(key: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::CloudObject,
            identifier: key.into(),
        }
    }
}

/// Errors produced while validating a clip request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("startTime and endTime must be finite numbers")]
    NonFiniteOffset,

    #[error("startTime must be >= 0")]
    NegativeStart,

    #[error("endTime must be greater than startTime")]
    EndBeforeStart,

    #[error("identifier must not be empty")]
    EmptyIdentifier,
}

/// A validated clip extraction request.
///
/// Built once from incoming query parameters, validated before any I/O is
/// performed, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRequest {
    pub source: ClipSource,
    /// Clip start offset in seconds.
    pub start_secs: f64,
    /// Clip end offset in seconds. Invariant: `end_secs > start_secs >= 0`.
    pub end_secs: f64,
}

impl ClipRequest {
    /// Validate offsets and construct a request.
    pub fn new(source: ClipSource, start_secs: f64, end_secs: f64) -> Result<Self, RequestError> {
        if !start_secs.is_finite() || !end_secs.is_finite() {
            return Err(RequestError::NonFiniteOffset);
        }
        if start_secs < 0.0 {
            return Err(RequestError::NegativeStart);
        }
        if end_secs <= start_secs {
            return Err(RequestError::EndBeforeStart);
        }
        if source.identifier.trim().is_empty() {
            return Err(RequestError::EmptyIdentifier);
        }

        Ok(Self {
            source,
            start_secs,
            end_secs,
        })
    }

    /// Clip duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}
