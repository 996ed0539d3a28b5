//! # HTTP Server for QR Code Management
//!
//! Exposes the QR pipeline to the MenúFácil dashboard over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! menufacil serve --listen 0.0.0.0:8080 --config menufacil.toml
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Rate limited |
//! |--------|------|--------------|
//! | POST | `/api/qr/preview` | no |
//! | POST | `/api/qr/export` | yes |
//! | GET | `/api/menus/:menu_id/qr-codes` | no |
//! | POST | `/api/menus/:menu_id/qr-codes` | yes |
//! | GET | `/api/restaurants/:restaurant_id/qr-codes` | no |
//! | DELETE | `/api/qr-codes/:id` | no |
//! | GET | `/api/qr-codes/:id/export/:format` | yes |
//! | POST | `/api/qr-codes/:id/scan` | no |

mod handlers;
mod rate_limit;
mod state;

pub use rate_limit::{RateLimiter, client_ip};
pub use state::{AppState, ServerConfig};

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;

use crate::error::{MenuFacilError, Result};
use crate::store::QrCodeStore;

/// Build the router for a given state.
pub fn router(state: Arc<AppState>) -> Router {
    let limit = middleware::from_fn_with_state(state.clone(), rate_limit::limit);

    Router::new()
        // Stateless QR API
        .route("/api/qr/preview", post(handlers::qr::preview))
        .route(
            "/api/qr/export",
            post(handlers::qr::export).layer(limit.clone()),
        )
        // Records API
        .route(
            "/api/menus/:menu_id/qr-codes",
            get(handlers::records::list)
                .merge(post(handlers::records::create_batch).layer(limit.clone())),
        )
        .route(
            "/api/restaurants/:restaurant_id/qr-codes",
            get(handlers::records::list_for_restaurant),
        )
        .route("/api/qr-codes/:id", delete(handlers::records::delete))
        .route(
            "/api/qr-codes/:id/export/:format",
            get(handlers::records::export).layer(limit),
        )
        .route("/api/qr-codes/:id/scan", post(handlers::records::scan))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use menufacil::server::{serve, ServerConfig};
/// use menufacil::store::MemoryStore;
///
/// # async fn example() -> Result<(), menufacil::error::MenuFacilError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     rate_limit_requests: 30,
///     rate_limit_window: Duration::from_secs(60),
/// };
///
/// serve(config, Arc::new(MemoryStore::new())).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig, store: Arc<dyn QrCodeStore>) -> Result<()> {
    let app_state = Arc::new(AppState::new(config.clone(), store));

    // Spawn background rate-limit cleanup task
    tokio::spawn(cleanup_rate_limits(app_state.clone()));

    let app = router(app_state);

    tracing::info!(
        listen = %config.listen_addr,
        rate_limit = config.rate_limit_requests,
        "MenúFácil QR server starting"
    );

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            MenuFacilError::Config(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Background task dropping expired rate-limit windows.
async fn cleanup_rate_limits(state: Arc<AppState>) {
    let period = state
        .config
        .rate_limit_window
        .max(Duration::from_secs(1));
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;
        let removed = state.limiter.cleanup(Instant::now()).await;
        if removed > 0 {
            let remaining = state.limiter.tracked_clients().await;
            tracing::debug!(removed, remaining, "cleaned up expired rate-limit windows");
        }
    }
}
