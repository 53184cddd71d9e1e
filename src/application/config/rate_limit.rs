use std::time::Duration;

use super::env_parse;

/// Fixed-window rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed per key in the window
    pub max_requests: u32,
    /// Window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            env_parse("VOICEDROP_RATE_LIMIT_MAX", 100),
            env_parse("VOICEDROP_RATE_LIMIT_WINDOW_SECS", 900),
        )
    }
}
