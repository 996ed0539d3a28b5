//! Server state and configuration.

use std::sync::Arc;
use std::time::Duration;

use super::rate_limit::RateLimiter;
use crate::config::AppConfig;
use crate::export::Exporter;
use crate::store::QrCodeStore;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Requests per client per window on export/batch routes; 0 disables
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            listen_addr: config.server.listen_addr.clone(),
            rate_limit_requests: config.rate_limit.requests,
            rate_limit_window: Duration::from_secs(config.rate_limit.window_secs),
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<dyn QrCodeStore>,
    pub exporter: Exporter,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Arc<dyn QrCodeStore>) -> Self {
        let limiter = RateLimiter::new(config.rate_limit_requests, config.rate_limit_window);
        Self {
            config,
            store,
            exporter: Exporter::new(),
            limiter,
        }
    }
}
