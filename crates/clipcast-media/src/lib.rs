//! Subprocess wrappers around yt-dlp and FFmpeg plus temp-file ownership.

pub mod download;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod temp;

pub use download::{download_with_ytdlp, is_streaming_url};
pub use error::{MediaError, MediaResult};
pub use extract::{clip_args, spawn_clip_stream, ExtractionProcess};
pub use fetch::fetch_to_file;
pub use temp::{random_temp_path, remove_quietly, MaterializedSource};
