//! Direct HTTP download of a video to a local temp file.

use std::path::Path;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};
use crate::temp::remove_quietly;

/// Stream an HTTP GET response body to `dest`.
///
/// A non-200 status or a mid-stream network error fails with
/// `DownloadFailed` and deletes any partially written file.
pub async fn fetch_to_file(client: &reqwest::Client, url: &str, dest: &Path) -> MediaResult<()> {
    debug!(url = %url, dest = %dest.display(), "Fetching video over HTTP");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| MediaError::download_failed(format!("Request failed: {}", e)))?;

    if response.status() != reqwest::StatusCode::OK {
        return Err(MediaError::download_failed(format!(
            "Unexpected status {} from {}",
            response.status(),
            url
        )));
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                drop(file);
                remove_quietly(dest).await;
                return Err(MediaError::download_failed(format!(
                    "Body stream failed after {} bytes: {}",
                    written, e
                )));
            }
        };
        if let Err(e) = file.write_all(&chunk).await {
            drop(file);
            remove_quietly(dest).await;
            return Err(MediaError::Io(e));
        }
        written += chunk.len() as u64;
    }

    file.flush().await?;

    info!(
        dest = %dest.display(),
        size_mb = written as f64 / (1024.0 * 1024.0),
        "Fetched video successfully"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_writes_body_to_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.mp4");
        let client = reqwest::Client::new();

        fetch_to_file(&client, &format!("{}/video.mp4", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"mp4-bytes");
    }

    #[tokio::test]
    async fn test_fetch_non_200_fails_without_residue() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.mp4"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.mp4");
        let client = reqwest::Client::new();

        let err = fetch_to_file(&client, &format!("{}/missing.mp4", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.mp4");
        let client = reqwest::Client::new();

        // Port 1 is never listening
        let err = fetch_to_file(&client, "http://127.0.0.1:1/video.mp4", &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(!dest.exists());
    }
}
