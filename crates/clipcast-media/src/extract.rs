//! Clip extraction via FFmpeg stream copy.
//!
//! The extractor never re-encodes: it seeks to the start offset, truncates
//! at the end offset and remuxes both tracks into a fragmented MP4 written
//! to stdout, so the consumer can start playback before the process exits.

use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Build the FFmpeg argument list for a stream-copied clip.
///
/// `-avoid_negative_ts make_zero` normalizes timestamps after seeking;
/// `-movflags frag_keyframe+empty_moov` produces a fragmented container
/// that is playable before EOF, which matters because the full byte length
/// is unknown while the process is still running.
pub fn clip_args(input: &Path, start_secs: f64, end_secs: f64) -> Vec<String> {
    let duration = end_secs - start_secs;
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-ss".to_string(),
        format!("{:.3}", start_secs),
        "-t".to_string(),
        format!("{:.3}", duration),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-avoid_negative_ts".to_string(),
        "make_zero".to_string(),
        "-movflags".to_string(),
        "frag_keyframe+empty_moov".to_string(),
        "-f".to_string(),
        "mp4".to_string(),
        "pipe:1".to_string(),
    ]
}

/// A live FFmpeg clip-extraction subprocess.
///
/// The child is spawned with `kill_on_drop`, so abandoning the handle (for
/// example when the client disconnects mid-stream) terminates FFmpeg
/// instead of leaving it running against a temp file.
pub struct ExtractionProcess {
    child: Child,
}

impl ExtractionProcess {
    /// Take the stdout pipe carrying the clip bytes.
    pub fn take_stdout(&mut self) -> MediaResult<ChildStdout> {
        self.child.stdout.take().ok_or_else(|| {
            MediaError::extraction_start_failed("FFmpeg stdout pipe was not captured")
        })
    }

    /// Take the stderr pipe, if it has not been taken already.
    ///
    /// Stderr must be drained while the clip is streaming: a child that
    /// fills the pipe with nobody reading blocks on the next write.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Unwrap the underlying child handle.
    pub fn into_inner(self) -> Child {
        self.child
    }

    /// Wait for the process and surface a nonzero exit as an error.
    ///
    /// Collects any remaining stderr for the error message.
    pub async fn finish(self) -> MediaResult<()> {
        let output = self
            .child
            .wait_with_output()
            .await
            .map_err(MediaError::Io)?;

        if output.status.success() {
            debug!("FFmpeg completed");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(MediaError::extraction_failed(
                stderr
                    .lines()
                    .last()
                    .unwrap_or("no stderr output")
                    .to_string(),
                Some(stderr),
                output.status.code(),
            ))
        }
    }
}

/// Spawn FFmpeg to extract `[start_secs, end_secs)` from `input`, streaming
/// the remuxed clip to stdout.
pub fn spawn_clip_stream(
    input: &Path,
    start_secs: f64,
    end_secs: f64,
) -> MediaResult<ExtractionProcess> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let args = clip_args(input, start_secs, end_secs);
    debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

    let child = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| MediaError::extraction_start_failed(e.to_string()))?;

    info!(
        input = %input.display(),
        start = start_secs,
        end = end_secs,
        "Spawned FFmpeg clip extraction"
    );

    Ok(ExtractionProcess { child })
}
