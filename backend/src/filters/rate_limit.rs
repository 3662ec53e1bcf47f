//! Fixed-window rate limiter keyed by client IP.

use super::RequestFilter;
use crate::error::ApiError;
use async_trait::async_trait;
use axum::extract::{ConnectInfo, Request};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Prune expired windows once the table grows past this many clients
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// In-memory per-IP request counter
#[derive(Debug, Clone)]
pub struct RateLimitFilter {
    windows: Arc<Mutex<HashMap<Option<IpAddr>, Window>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimitFilter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Count one request for `client`; false once the window is exhausted
    ///
    /// Requests without connection info share a single `None` bucket.
    pub async fn check(&self, client: Option<IpAddr>, now: Instant) -> bool {
        let mut windows = self.windows.lock().await;

        if windows.len() > PRUNE_THRESHOLD {
            let span = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < span);
        }

        let entry = windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            return false;
        }
        entry.count += 1;
        true
    }
}

#[async_trait]
impl RequestFilter for RateLimitFilter {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn on_request(&self, request: &mut Request) -> Result<(), ApiError> {
        let client = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        if self.check(client, Instant::now()).await {
            Ok(())
        } else {
            warn!(client = ?client, "Rate limit exceeded");
            Err(ApiError::TooManyRequests)
        }
    }
}
