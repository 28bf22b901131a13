//! Fixed-window rate limiter middleware
//!
//! Once a window's permits are gone, up to `queue_limit` further requests
//! wait for the next window instead of being rejected straight away.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::RateLimitConfig;
use crate::error::ApiError;
use crate::AppState;

/// Admits at most `permit_limit` requests per window across all clients
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Arc<Mutex<FixedWindow>>,
    queued: Arc<AtomicU32>,
    permit_limit: u32,
    queue_limit: u32,
    window_len: Duration,
}

#[derive(Debug)]
struct FixedWindow {
    started: Instant,
    used: u32,
}

impl FixedWindow {
    fn roll(&mut self, now: Instant, window_len: Duration) {
        if now.duration_since(self.started) >= window_len {
            self.started = now;
            self.used = 0;
        }
    }
}

/// Holds a queue slot; released on drop so abandoned requests free it too
struct QueueSlot(Arc<AtomicU32>);

impl Drop for QueueSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl RateLimiter {
    pub fn new(permit_limit: u32, window_len: Duration, queue_limit: u32) -> Self {
        Self {
            window: Arc::new(Mutex::new(FixedWindow {
                started: Instant::now(),
                used: 0,
            })),
            queued: Arc::new(AtomicU32::new(0)),
            permit_limit,
            queue_limit,
            window_len,
        }
    }

    /// `None` when rate limiting is switched off
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        config.enabled.then(|| {
            Self::new(config.permit_limit, config.window(), config.queue_limit)
        })
    }

    /// Takes a permit, queueing for a later window while the queue has room
    ///
    /// Returns `false` when the window is exhausted and the queue is full.
    pub async fn acquire(&self) -> bool {
        loop {
            let (_slot, wait) = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                window.roll(now, self.window_len);

                if window.used < self.permit_limit {
                    window.used += 1;
                    return true;
                }
                if self.queued.load(Ordering::Acquire) >= self.queue_limit {
                    return false;
                }

                self.queued.fetch_add(1, Ordering::AcqRel);
                let slot = QueueSlot(self.queued.clone());
                let wait = (window.started + self.window_len).saturating_duration_since(now);
                (slot, wait)
            };

            debug!(wait_ms = wait.as_millis() as u64, "Queued for next rate limit window");
            tokio::time::sleep(wait).await;
        }
    }

    /// Requests currently waiting for a permit
    pub fn queued(&self) -> u32 {
        self.queued.load(Ordering::Acquire)
    }
}

/// Rejects requests with 429 once the window's permits and queue are used up
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(limiter) = &state.rate_limiter {
        if !limiter.acquire().await {
            warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "Rate limit exceeded"
            );
            return ApiError::RateLimited.into_response();
        }
    }

    next.run(request).await
}
