//! Application state.

use std::sync::Arc;

use clipcast_storage::SupabaseClient;

use crate::config::ApiConfig;

/// Shared application state.
///
/// Built once during process bootstrap and passed by reference into every
/// request handler; there are no ambient mutable globals.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Arc<SupabaseClient>,
    /// Shared HTTP client for direct video fetches.
    pub http: reqwest::Client,
}

impl AppState {
    /// Create application state, reading storage credentials from the
    /// environment.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let storage = SupabaseClient::from_env()?;
        Ok(Self::with_storage(config, storage))
    }

    /// Create application state with an explicit storage client.
    pub fn with_storage(config: ApiConfig, storage: SupabaseClient) -> Self {
        Self {
            config,
            storage: Arc::new(storage),
            http: reqwest::Client::new(),
        }
    }
}
