//! Source materialization.
//!
//! Given a validated source descriptor, ensure a local, filesystem-readable
//! copy of the video exists: confirm a pre-existing file under the mounted
//! downloads directory, or download via yt-dlp (streaming platforms) or a
//! direct HTTP GET (plain URLs and signed storage URLs).

use clipcast_media::{
    download_with_ytdlp, fetch_to_file, is_streaming_url, random_temp_path, MaterializedSource,
};
use clipcast_models::{sanitize_filename, ClipSource, SourceKind};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Produce a `MaterializedSource` for the request, or fail.
///
/// Local files are owned by the external mount and never marked temporary;
/// every downloaded artifact is temporary and owned by the caller.
pub async fn materialize(state: &AppState, source: &ClipSource) -> ApiResult<MaterializedSource> {
    match source.kind {
        SourceKind::LocalFile => {
            let name = sanitize_filename(&source.identifier);
            if name.is_empty() {
                return Err(ApiError::bad_request("Invalid input file name"));
            }

            let path = state.config.downloads_dir.join(&name);
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {
                    debug!(path = %path.display(), "Using mounted local file");
                    Ok(MaterializedSource::persistent(path))
                }
                _ => Err(ApiError::not_found(format!("Local file not found: {}", name))),
            }
        }

        SourceKind::RemoteUrl if is_streaming_url(&source.identifier) => {
            let path = download_with_ytdlp(&source.identifier, &state.config.temp_dir).await?;
            Ok(MaterializedSource::temporary(path))
        }

        SourceKind::RemoteUrl => {
            let dest = random_temp_path(&state.config.temp_dir, "source", "mp4");
            fetch_to_file(&state.http, &source.identifier, &dest).await?;
            Ok(MaterializedSource::temporary(dest))
        }

        SourceKind::CloudObject => {
            let signed = state
                .storage
                .create_signed_url(&source.identifier, state.config.signed_url_ttl)
                .await?;
            let dest = random_temp_path(&state.config.temp_dir, "source", "mp4");
            fetch_to_file(&state.http, &signed, &dest).await?;
            Ok(MaterializedSource::temporary(dest))
        }
    }
}
