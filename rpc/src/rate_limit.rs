//! Per-client fixed-window rate limiting.
//!
//! Two limiters are installed: a general one counting every request, and a
//! stricter one on the login routes that only counts failed attempts.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::RpcError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum counted requests per window.
    pub max_requests: u64,
    pub window_secs: u64,
}

impl RateLimitConfig {
    /// 100 requests per 15 minutes.
    pub fn general() -> Self {
        Self {
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }

    /// 5 failed login attempts per 15 minutes.
    pub fn auth() -> Self {
        Self {
            max_requests: 5,
            window_secs: 15 * 60,
        }
    }
}

#[derive(Debug, Clone)]
struct BucketState {
    count: u64,
    window_start: Instant,
}

#[derive(Debug)]
struct Buckets {
    by_client: HashMap<String, BucketState>,
    last_sweep: Instant,
}

/// Buckets whose window has run out are dropped at most once per window, so
/// the table only holds clients seen in roughly the last two windows.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<Mutex<Buckets>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(Mutex::new(Buckets {
                by_client: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_secs)
    }

    fn lock_swept(&self, now: Instant) -> MutexGuard<'_, Buckets> {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let window = self.window();
        if now.duration_since(buckets.last_sweep) >= window {
            buckets
                .by_client
                .retain(|_, b| now.duration_since(b.window_start) < window);
            buckets.last_sweep = now;
        }
        buckets
    }

    fn with_bucket<T>(&self, key: &str, f: impl FnOnce(&mut BucketState) -> T) -> T {
        let now = Instant::now();
        let mut buckets = self.lock_swept(now);
        let bucket = buckets
            .by_client
            .entry(key.to_string())
            .or_insert(BucketState {
                count: 0,
                window_start: now,
            });
        if now.duration_since(bucket.window_start) >= self.window() {
            bucket.count = 0;
            bucket.window_start = now;
        }
        f(bucket)
    }

    /// Count a request from `key`; false once the window's budget is spent.
    pub fn check(&self, key: &str) -> bool {
        let max = self.config.max_requests;
        self.with_bucket(key, |bucket| {
            if bucket.count >= max {
                false
            } else {
                bucket.count += 1;
                true
            }
        })
    }

    /// Whether `key` has used up its budget, without counting anything.
    pub fn is_exhausted(&self, key: &str) -> bool {
        let now = Instant::now();
        let buckets = self.lock_swept(now);
        buckets.by_client.get(key).is_some_and(|bucket| {
            now.duration_since(bucket.window_start) < self.window()
                && bucket.count >= self.config.max_requests
        })
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.lock_swept(Instant::now()).by_client.len()
    }

    pub fn record(&self, key: &str) {
        self.with_bucket(key, |bucket| bucket.count += 1);
    }
}

/// The client's IP, or `"unknown"` when the server was not started with
/// connection info.
pub fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn limit_requests(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    if !limiter.check(&key) {
        tracing::warn!(client = %key, "request rate limit exceeded");
        return RpcError::RateLimited(
            "Too many requests from this IP, please try again later.".into(),
        )
        .into_response();
    }
    next.run(request).await
}

/// Like [`limit_requests`] but only unsuccessful responses use up budget.
pub async fn limit_failed_attempts(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    if limiter.is_exhausted(&key) {
        tracing::warn!(client = %key, "authentication rate limit exceeded");
        return RpcError::RateLimited(
            "Too many authentication attempts, please try again later.".into(),
        )
        .into_response();
    }
    let response = next.run(request).await;
    if !response.status().is_success() {
        limiter.record(&key);
    }
    response
}
