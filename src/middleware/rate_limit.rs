//! Fixed-window, in-memory rate limiting
//!
//! Requests are counted per client key (peer IP, or the first
//! `X-Forwarded-For` entry when running behind a trusted proxy). State is
//! per process and is lost on restart.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;

use crate::config::rate_limit::RateLimitConfig;
use crate::error::AppError;
use crate::state::AppState;

// Expired windows are swept once the table grows past this
const PRUNE_THRESHOLD: usize = 10_000;

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_after: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    trust_proxy: bool,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, trust_proxy: bool) -> Self {
        Self {
            config,
            trust_proxy,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn limit(&self) -> u32 {
        self.config.max_requests
    }

    /// Count one request for `key` and report whether it is allowed
    pub fn check(&self, key: &str) -> RateLimitResult {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateLimitResult {
        let window_len = self.config.window;
        let mut windows = self.windows.lock();

        if windows.len() > PRUNE_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.started) < window_len);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= window_len {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        let reset_after = window_len.saturating_sub(now.duration_since(window.started));

        if window.count >= self.config.max_requests {
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_after,
            };
        }

        window.count += 1;
        RateLimitResult {
            allowed: true,
            remaining: self.config.max_requests - window.count,
            reset_after,
        }
    }

    /// Resolve the client key for a request
    fn client_key(&self, req: &Request) -> String {
        if self.trust_proxy {
            let forwarded = req
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(|v| v.trim())
                .filter(|v| !v.is_empty());
            if let Some(ip) = forwarded {
                return ip.to_string();
            }
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Middleware rejecting clients over their window with 429
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let limiter = &state.rate_limiter;
    let key = limiter.client_key(&req);
    let result = limiter.check(&key);

    if !result.allowed {
        tracing::warn!(client = %key, "Rate limit exceeded");
        let mut response =
            AppError::TooManyRequests("Too many requests, please try again later".to_string())
                .into_response();
        let retry_after = result.reset_after.as_secs().max(1);
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
            response.headers_mut().insert("retry-after", value);
        }
        return response;
    }

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&limiter.limit().to_string()) {
        headers.insert("x-ratelimit-limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&result.remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", value);
    }
    response
}
