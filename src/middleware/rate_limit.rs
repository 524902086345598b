// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-client fixed-window rate limiting.
//!
//! Clients are keyed by peer IP. `X-Forwarded-For` is honoured only when the
//! limiter is told to trust the proxy in front of it. The number of tracked
//! clients is capped; once full, new clients share a single overflow bucket
//! until expired windows are swept.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Upper bound on distinct clients tracked at once.
const DEFAULT_MAX_CLIENTS: usize = 50_000;

/// Bucket shared by new clients while the table is full.
const OVERFLOW_KEY: &str = "<overflow>";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Counts requests per client key within fixed windows.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    max_clients: usize,
    trust_proxy: bool,
    windows: DashMap<String, Window>,
    /// When expired windows were last swept. Sweeps run at most once per window.
    last_sweep: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_max_clients(max_requests, window, DEFAULT_MAX_CLIENTS)
    }

    pub fn with_max_clients(max_requests: u32, window: Duration, max_clients: usize) -> Self {
        Self {
            max_requests,
            window,
            max_clients,
            trust_proxy: false,
            windows: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Take the client key from `X-Forwarded-For` when present.
    pub fn trust_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy = trust;
        self
    }

    /// Record a request from `key` at `now`. Returns false if over the limit.
    pub fn check(&self, key: &str, now: Instant) -> bool {
        let mut key = key;
        if !self.windows.contains_key(key) && self.windows.len() >= self.max_clients {
            self.sweep(now);
            if self.windows.len() >= self.max_clients {
                key = OVERFLOW_KEY;
            }
        }

        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.saturating_duration_since(entry.started) >= self.window {
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

    /// Drop expired windows, unless a sweep already ran within the last window.
    fn sweep(&self, now: Instant) {
        // Another caller holding the lock is already sweeping.
        let Ok(mut last) = self.last_sweep.try_lock() else {
            return;
        };
        if now.saturating_duration_since(*last) < self.window {
            return;
        }
        *last = now;

        let window = self.window;
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < window);
        tracing::debug!(
            removed = before.saturating_sub(self.windows.len()),
            remaining = self.windows.len(),
            "Swept expired rate limit windows"
        );
    }

    fn client_key(&self, request: &Request) -> String {
        let forwarded = self
            .trust_proxy
            .then(|| forwarded_for(request))
            .flatten();

        forwarded
            .or_else(|| {
                request
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// First `X-Forwarded-For` hop, if any.
fn forwarded_for(request: &Request) -> Option<String> {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

/// Reject requests over the configured per-client limit with 429.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let key = state.rate_limiter.client_key(&request);

    if !state.rate_limiter.check(&key, Instant::now()) {
        tracing::warn!(client = %key, "Rate limit exceeded");
        return AppError::RateLimited.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_from(peer: &str, forwarded: Option<&str>) -> Request {
        let mut builder = Request::builder();
        if let Some(ip) = forwarded {
            builder = builder.header("x-forwarded-for", ip);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        request
    }

    #[test]
    fn test_limit_applies_per_key() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check("a", now));
        assert!(limiter.check("a", now));
        assert!(!limiter.check("a", now));
        assert!(limiter.check("b", now));
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check("a", now));
        assert!(!limiter.check("a", now + Duration::from_secs(30)));
        assert!(limiter.check("a", now + Duration::from_secs(61)));
    }

    #[test]
    fn test_forwarded_for_ignored_by_default() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        let request = request_from("192.0.2.10:5555", Some("203.0.113.7"));
        assert_eq!(limiter.client_key(&request), "192.0.2.10");

        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(limiter.client_key(&request), "unknown");
    }

    #[test]
    fn test_forwarded_for_used_when_proxy_trusted() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60)).trust_proxy(true);

        let request = request_from("10.0.0.1:443", Some("203.0.113.7, 10.0.0.1"));
        assert_eq!(limiter.client_key(&request), "203.0.113.7");

        let request = request_from("10.0.0.1:443", None);
        assert_eq!(limiter.client_key(&request), "10.0.0.1");
    }

    #[test]
    fn test_rotating_forwarded_for_shares_peer_budget() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        let accepted = (0..50)
            .filter(|i| {
                let request = request_from("198.51.100.1:40000", Some(&format!("10.9.{}.1", i)));
                limiter.check(&limiter.client_key(&request), now)
            })
            .count();
        assert_eq!(accepted, 3);
    }

    #[test]
    fn test_full_table_uses_overflow_bucket() {
        let limiter = RateLimiter::with_max_clients(2, Duration::from_secs(60), 3);
        let now = Instant::now();

        for key in ["a", "b", "c"] {
            assert!(limiter.check(key, now));
        }

        // New clients share one bucket while the table is full
        assert!(limiter.check("d", now));
        assert!(limiter.check("e", now));
        assert!(!limiter.check("f", now));
        assert!(!limiter.windows.contains_key("d"));

        // Known clients keep their own budget
        assert!(limiter.check("a", now));
    }

    #[test]
    fn test_table_size_is_bounded() {
        let limiter = RateLimiter::with_max_clients(100, Duration::from_secs(60), 1_000);
        let now = Instant::now();

        for i in 0..30_000 {
            limiter.check(&format!("client-{}", i), now);
        }

        // Cap plus the overflow bucket
        assert!(limiter.windows.len() <= 1_001);
    }

    #[test]
    fn test_expired_windows_swept_when_full() {
        let window = Duration::from_secs(60);
        let limiter = RateLimiter::with_max_clients(1, window, 2);
        let start = Instant::now();

        assert!(limiter.check("a", start));
        assert!(limiter.check("b", start));

        // After the window, a new client triggers a sweep and gets its own slot
        let later = start + window * 2;
        assert!(limiter.check("c", later));
        assert!(limiter.windows.contains_key("c"));
        assert!(!limiter.windows.contains_key("a"));
    }
}
