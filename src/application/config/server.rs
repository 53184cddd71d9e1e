use std::env;

use super::{env_flag, env_parse};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from `VOICEDROP_ALLOWED_ORIGINS` (comma-separated).
    /// When empty, any origin is allowed (dev convenience).
    pub allowed_origins: Vec<String>,
    /// Take the client address from `X-Forwarded-For` when running behind a proxy.
    pub trust_proxy: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let allowed_origins = env::var("VOICEDROP_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host: env::var("VOICEDROP_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("VOICEDROP_API_PORT", 3000),
            allowed_origins,
            trust_proxy: env_flag("VOICEDROP_TRUST_PROXY"),
        }
    }
}
