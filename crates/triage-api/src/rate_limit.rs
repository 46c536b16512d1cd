//! Fixed-window rate limiter for session routes.
//!
//! Counts requests per wall-clock second with two atomics; the counter
//! resets whenever a request lands in a new second.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Extension, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[derive(Clone)]
pub struct RateLimiter {
    max_per_sec: u64,
    count: Arc<AtomicU64>,
    /// Epoch second of the current window.
    window: Arc<AtomicU64>,
}

impl RateLimiter {
    pub fn new(max_per_sec: u64) -> Self {
        Self {
            max_per_sec,
            count: Arc::new(AtomicU64::new(0)),
            window: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns true if a request at epoch second `now` is allowed.
    fn try_acquire_at(&self, now: u64) -> bool {
        if self.max_per_sec == 0 {
            return false;
        }

        if self.window.swap(now, Ordering::Relaxed) != now {
            self.count.store(1, Ordering::Relaxed);
            return true;
        }

        self.count.fetch_add(1, Ordering::Relaxed) < self.max_per_sec
    }

    pub fn try_acquire(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.try_acquire_at(now)
    }
}

/// Axum middleware that enforces the rate limit.
pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.try_acquire() {
        return next.run(req).await;
    }

    tracing::warn!(path = %req.uri().path(), "Rate limit exceeded");
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "error": "too_many_requests",
            "message": "Rate limit exceeded"
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_within_one_second() {
        let limiter = RateLimiter::new(3);
        assert!(limiter.try_acquire_at(100));
        assert!(limiter.try_acquire_at(100));
        assert!(limiter.try_acquire_at(100));
        assert!(!limiter.try_acquire_at(100));
    }

    #[test]
    fn test_new_window_resets_count() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.try_acquire_at(100));
        assert!(!limiter.try_acquire_at(100));
        assert!(limiter.try_acquire_at(101));
    }

    #[test]
    fn test_zero_limit_rejects_everything() {
        let limiter = RateLimiter::new(0);
        assert!(!limiter.try_acquire_at(100));
    }
}
