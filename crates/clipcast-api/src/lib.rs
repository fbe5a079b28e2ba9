//! HTTP API for clip extraction, video delivery, and highlight analysis.

pub mod config;
pub mod error;
pub mod handlers;
pub mod materialize;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod stream;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
