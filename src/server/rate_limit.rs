//! Basic in-memory rate limiting.
//!
//! Fixed windows per client IP. The client is taken from the first
//! `X-Forwarded-For` entry when present, otherwise from the peer address.

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::state::AppState;

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client IP.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    /// `max_requests == 0` lets everything through.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub async fn check(&self, client: IpAddr) -> Result<(), Duration> {
        self.check_at(client, Instant::now()).await
    }

    /// Count one request at `now`. On refusal, returns the time until the
    /// client's window resets.
    pub async fn check_at(&self, client: IpAddr, now: Instant) -> Result<(), Duration> {
        if self.max_requests == 0 {
            return Ok(());
        }

        let mut clients = self.clients.lock().await;
        let window = clients.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            return Err(self.window - now.duration_since(window.started));
        }
        window.count += 1;
        Ok(())
    }

    /// Drop windows that have expired. Returns how many were removed.
    pub async fn cleanup(&self, now: Instant) -> usize {
        let mut clients = self.clients.lock().await;
        let before = clients.len();
        clients.retain(|_, w| now.duration_since(w.started) < self.window);
        before - clients.len()
    }

    pub async fn tracked_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}

/// Resolve the client address of a request.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| peer.map(|p| p.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware rejecting clients over their budget with 429.
pub async fn limit(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(request.headers(), peer.map(|ConnectInfo(addr)| addr));

    match state.limiter.check(client).await {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!(%client, path = %request.uri().path(), "rate limited");
            let secs = retry_after.as_secs().max(1);
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "success": false,
                    "error": format!("Too many requests, retry in {}s", secs),
                })),
            )
                .into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
            response
        }
    }
}
