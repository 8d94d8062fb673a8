//! Sliding-window request limiter, keyed by apparent client and endpoint.
//!
//! Each key keeps the epoch-millisecond timestamps of its accepted requests.
//! Denied requests are not recorded. State is process-local and is lost on
//! restart; several instances behind a balancer each count on their own.

use axum::http::HeaderMap;
use dashmap::DashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::RateLimitConfig;
use crate::metrics::RATE_LIMIT_KEYS;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Identity used for rate accounting: `<first forwarded ip>:<path>`.
pub fn client_key(headers: &HeaderMap, path: &str) -> String {
    let ip = headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown");

    format!("{ip}:{path}")
}

#[derive(Debug)]
pub struct RateLimiter {
    // client key -> accepted request timestamps (ms), oldest first
    requests: DashMap<String, Vec<i64>>,
    max_requests: usize,
    window_ms: i64,
    cleanup_threshold: usize,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            requests: DashMap::new(),
            max_requests: config.max_requests,
            window_ms: i64::try_from(config.window.as_millis()).unwrap_or(i64::MAX),
            cleanup_threshold: config.cleanup_threshold,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(u64::try_from(self.window_ms).unwrap_or(u64::MAX))
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Record and allow the request, or deny it without recording.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, chrono::Utc::now().timestamp_millis())
    }

    pub fn allow_at(&self, key: &str, now_ms: i64) -> bool {
        let cutoff = now_ms.saturating_sub(self.window_ms);

        // entry guard holds the shard lock, so check-and-record is atomic per key
        let allowed = {
            let mut timestamps = self.requests.entry(key.to_string()).or_default();
            timestamps.retain(|&t| t > cutoff);

            if timestamps.len() >= self.max_requests {
                false
            } else {
                timestamps.push(now_ms);
                true
            }
        };

        if !allowed {
            debug!(key, "rate limit exceeded");
        }

        if self.requests.len() > self.cleanup_threshold {
            self.sweep(cutoff);
        }
        RATE_LIMIT_KEYS.set(self.requests.len() as f64);

        allowed
    }

    // Drop stale timestamps everywhere and forget keys left empty
    fn sweep(&self, cutoff: i64) {
        let before = self.requests.len();
        self.requests.retain(|_, timestamps| {
            timestamps.retain(|&t| t > cutoff);
            !timestamps.is_empty()
        });
        debug!(before, after = self.requests.len(), "swept rate limit table");
    }

    pub fn tracked_keys(&self) -> usize {
        self.requests.len()
    }

    pub fn recorded(&self, key: &str) -> usize {
        self.requests.get(key).map_or(0, |t| t.len())
    }
}
