//! Clip filename derivation.

use crate::request::{ClipSource, SourceKind};
use crate::timestamp::format_offset;

/// Sanitize a filename component for safe use in headers and paths.
///
/// Strips path separators and `.`/`..` segments, then keeps ASCII
/// alphanumerics plus `-`, `_` and `.` (capped at 100 chars).
pub fn sanitize_filename(name: &str) -> String {
    let safe_joined: String = name
        .split(|c| c == '/' || c == '\\')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect::<Vec<_>>()
        .join("");

    safe_joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_' || *c == '.')
        .take(100)
        .collect()
}

/// Derive the stem (name without extension) used to label a source.
///
/// For URLs the last path segment is used; query strings and fragments are
/// ignored. Falls back to `"video"` when nothing usable remains.
fn source_stem(source: &ClipSource) -> String {
    let raw = match source.kind {
        SourceKind::RemoteUrl => source
            .identifier
            .split(['?', '#'])
            .next()
            .unwrap_or("")
            .rsplit('/')
            .next()
            .unwrap_or("")
            .to_string(),
        _ => source
            .identifier
            .rsplit('/')
            .next()
            .unwrap_or("")
            .to_string(),
    };

    let sanitized = sanitize_filename(&raw);
    let stem = sanitized
        .rsplit_once('.')
        .map(|(stem, _ext)| stem.to_string())
        .unwrap_or(sanitized);

    if stem.is_empty() {
        "video".to_string()
    } else {
        stem
    }
}

/// Derive the suggested output filename for an extracted clip.
///
/// Format: `clip_{stem}_{start}-{end}.mp4`, e.g. a clip of
/// `clip_source.mp4` from 10s to 20s becomes `clip_clip_source_10-20.mp4`.
pub fn derive_clip_filename(source: &ClipSource, start_secs: f64, end_secs: f64) -> String {
    format!(
        "clip_{}_{}-{}.mp4",
        source_stem(source),
        format_offset(start_secs),
        format_offset(end_secs)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my-video.mp4"), "my-video.mp4");
        assert_eq!(sanitize_filename("my video"), "myvideo");
        assert_eq!(sanitize_filename("../../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_derive_clip_filename_local() {
        let source = ClipSource::local_file("clip_source.mp4");
        assert_eq!(
            derive_clip_filename(&source, 10.0, 20.0),
            "clip_clip_source_10-20.mp4"
        );
    }

    #[test]
    fn test_derive_clip_filename_url() {
        let source = ClipSource::remote_url("https://example.com/media/talk.mp4?token=abc");
        assert_eq!(
            derive_clip_filename(&source, 0.0, 12.5),
            "clip_talk_0-12.5.mp4"
        );
    }

    #[test]
    fn test_derive_clip_filename_fallback_stem() {
        let source = ClipSource::remote_url("https://example.com/");
        assert_eq!(derive_clip_filename(&source, 1.0, 2.0), "clip_video_1-2.mp4");
    }
}
