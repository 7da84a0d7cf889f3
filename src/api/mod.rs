pub mod handlers;
pub mod params;
pub mod routes;

pub use routes::*;

use crate::config::{QueryConfig, ServerConfig};
use crate::service::HotfixService;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<HotfixService>,
    pub query: QueryConfig,
    pub server: ServerConfig,
    pub metrics_enabled: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<HotfixService>) -> Self {
        Self {
            service,
            query: QueryConfig::default(),
            server: ServerConfig::default(),
            metrics_enabled: true,
            started_at: Instant::now(),
        }
    }

    /// Set the query limits
    pub fn with_query_config(mut self, query: QueryConfig) -> Self {
        self.query = query;
        self
    }

    /// Set the server configuration (CORS origin)
    pub fn with_server_config(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// Expose or hide the `/metrics` endpoint
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }
}
