//! Request handlers.

pub mod analysis;
pub mod clip;
pub mod download;
pub mod health;

pub use health::{health, ready};
