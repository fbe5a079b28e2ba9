//! Video download using yt-dlp.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};
use crate::temp::random_temp_path;

/// Check if a URL belongs to a platform that needs yt-dlp.
///
/// Matches on the parsed host, not the raw string, so platform names in
/// query strings or paths do not count.
pub fn is_streaming_url(url: &str) -> bool {
    let supported_domains = [
        "youtube.com",
        "youtu.be",
        "vimeo.com",
        "twitter.com",
        "x.com",
        "twitch.tv",
        "tiktok.com",
    ];

    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };

    supported_domains
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
}

/// Download a video from a streaming platform into the temp directory.
///
/// yt-dlp is invoked with best combined audio+video quality and playlist
/// expansion disabled, targeting a randomized temp path. yt-dlp sometimes
/// appends its own container extension to the requested output, so success
/// probes both the requested path and the `.mp4`-suffixed variant and
/// returns whichever exists.
pub async fn download_with_ytdlp(url: &str, temp_dir: &Path) -> MediaResult<PathBuf> {
    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

    let requested = random_temp_path(temp_dir, "source", "");
    let requested_str = requested.to_string_lossy().to_string();

    info!(url = %url, output = %requested.display(), "Downloading video with yt-dlp");

    let output = Command::new("yt-dlp")
        .args([
            "-f",
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
            "--no-playlist",
            "-o",
            &requested_str,
            url,
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("yt-dlp stderr: {}", stderr);
        return Err(MediaError::download_failed(format!(
            "yt-dlp failed: {}",
            stderr.lines().last().unwrap_or("Unknown error")
        )));
    }

    // yt-dlp's output naming is not fully deterministic: probe the exact
    // path first, then the auto-extension variant.
    for candidate in [requested.clone(), requested.with_extension("mp4")] {
        if candidate.exists() {
            let file_size = candidate.metadata()?.len();
            info!(
                output = %candidate.display(),
                size_mb = file_size as f64 / (1024.0 * 1024.0),
                "Downloaded video successfully"
            );
            return Ok(candidate);
        }
    }

    Err(MediaError::download_failed("Output file not created"))
}
