//! Temporary artifact ownership and cleanup.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// Build a collision-free temp path under `dir`.
///
/// Every name embeds a v4 UUID, so concurrent requests sharing the temp
/// directory never contend for the same file.
pub fn random_temp_path(dir: &Path, prefix: &str, ext: &str) -> PathBuf {
    if ext.is_empty() {
        dir.join(format!("{}_{}", prefix, Uuid::new_v4()))
    } else {
        dir.join(format!("{}_{}.{}", prefix, Uuid::new_v4(), ext))
    }
}

/// Remove a temp file, tolerating its absence.
///
/// Cleanup must be idempotent and must never propagate past the request
/// handler, so a missing file is a no-op and other failures are logged.
pub async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed temp file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Temp file already absent")
        }
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temp file"),
    }
}

/// A local, filesystem-accessible copy of a source video.
///
/// When `is_temporary` is true the owning request handler is solely
/// responsible for deleting the file, exactly once, on every exit path.
#[derive(Debug)]
pub struct MaterializedSource {
    path: PathBuf,
    is_temporary: bool,
    cleaned: bool,
}

impl MaterializedSource {
    /// Wrap a pre-existing file owned by an external mount. Never deleted.
    pub fn persistent(path: PathBuf) -> Self {
        Self {
            path,
            is_temporary: false,
            cleaned: false,
        }
    }

    /// Wrap a downloaded temp file owned by the current request.
    pub fn temporary(path: PathBuf) -> Self {
        Self {
            path,
            is_temporary: true,
            cleaned: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }

    /// Delete the backing file if this source is temporary.
    ///
    /// Safe to call more than once; only the first call touches the
    /// filesystem.
    pub async fn cleanup(&mut self) {
        if self.is_temporary && !self.cleaned {
            remove_quietly(&self.path).await;
        }
        self.cleaned = true;
    }

    /// Give up ownership of the path without deleting it.
    ///
    /// Used when cleanup responsibility is handed to the response stream.
    pub fn into_cleanup_path(mut self) -> Option<PathBuf> {
        if self.is_temporary && !self.cleaned {
            self.cleaned = true;
            Some(std::mem::take(&mut self.path))
        } else {
            None
        }
    }
}
