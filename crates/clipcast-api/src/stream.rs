//! Guaranteed resource release for streamed responses.

use std::path::PathBuf;

use clipcast_media::{remove_quietly, ExtractionProcess};
use tracing::{debug, warn};

/// Cleanup guard attached to a streaming response body.
///
/// Dropping the guard reaps the FFmpeg child (killing it if it is still
/// running) and deletes the request's temp download. This covers completed
/// streams, mid-stream errors and client disconnects alike. Cleanup runs at
/// most once and never panics past the handler boundary.
pub struct StreamCleanup {
    process: Option<ExtractionProcess>,
    temp: Option<PathBuf>,
}

impl StreamCleanup {
    pub fn new(process: Option<ExtractionProcess>, temp: Option<PathBuf>) -> Self {
        Self { process, temp }
    }
}

impl Drop for StreamCleanup {
    fn drop(&mut self) {
        let process = self.process.take();
        let temp = self.temp.take();
        if process.is_none() && temp.is_none() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Some(process) = process {
                        reap(process).await;
                    }
                    if let Some(path) = temp {
                        remove_quietly(&path).await;
                    }
                });
            }
            Err(_) => {
                // Runtime already gone (process shutdown); best-effort removal.
                if let Some(path) = temp {
                    let _ = std::fs::remove_file(path);
                }
            }
        }
    }
}

/// Wait for the extraction child, killing it first if the stream was
/// abandoned before EOF.
async fn reap(process: ExtractionProcess) {
    let mut child = process.into_inner();

    // Still running means the body was dropped before the stream ended
    // (client abort): stop FFmpeg instead of letting it run to completion.
    if matches!(child.try_wait(), Ok(None)) {
        let _ = child.start_kill();
    }

    match child.wait_with_output().await {
        Ok(output) if output.status.success() => {
            debug!("FFmpeg stream completed");
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            // Headers are long gone at this point; closing the connection is
            // all that remains, so the failure is only logged.
            warn!(
                exit_code = ?output.status.code(),
                stderr = %stderr.lines().last().unwrap_or(""),
                "FFmpeg exited with non-zero status during streaming"
            );
        }
        Err(e) => warn!(error = %e, "Failed to reap FFmpeg process"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn wait_for_removal(path: &std::path::Path) -> bool {
        for _ in 0..50 {
            if !path.exists() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drop_deletes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.mp4");
        tokio::fs::write(&path, b"data").await.unwrap();

        drop(StreamCleanup::new(None, Some(path.clone())));

        // Deletion runs on a spawned task, so poll rather than assert once
        assert!(wait_for_removal(&path).await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drop_tolerates_already_deleted_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.mp4");

        drop(StreamCleanup::new(None, Some(path.clone())));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drop_without_resources_is_a_no_op() {
        drop(StreamCleanup::new(None, None));
    }
}
