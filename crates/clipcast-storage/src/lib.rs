//! Supabase Storage client.
//!
//! This crate provides:
//! - Short-lived signed URL generation for private objects
//! - Streaming object download to a local file
//! - Object upload and existence checks

pub mod client;
pub mod error;

pub use client::{SupabaseClient, SupabaseConfig};
pub use error::{StorageError, StorageResult};
