//! Shared data models for the clipcast backend.
//!
//! This crate provides Serde-serializable types for:
//! - Clip extraction requests and source descriptors
//! - AI highlight descriptors
//! - Timestamp parsing and clip filename derivation

pub mod filename;
pub mod highlight;
pub mod request;
pub mod timestamp;

// Re-export common types
pub use filename::{derive_clip_filename, sanitize_filename};
pub use highlight::{Highlight, HighlightCategory, HighlightsData};
pub use request::{ClipRequest, ClipSource, RequestError, SourceKind};
pub use timestamp::{format_offset, parse_timestamp, TimestampError};
