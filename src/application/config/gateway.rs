use std::env;
use std::time::Duration;

use super::env_parse;

/// Broadcast gateway account and endpoint
#[derive(Clone)]
pub struct GatewayConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub operation: String,
    pub timeout: Duration,
}

// Hand-written so the account password never reaches the logs.
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("operation", &self.operation)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            url: env::var("VOICEDROP_GATEWAY_URL")
                .unwrap_or_else(|_| "https://api.voicedropgateway.com/broadcast".to_string()),
            username: env::var("VOICEDROP_GATEWAY_USERNAME").unwrap_or_default(),
            password: env::var("VOICEDROP_GATEWAY_PASSWORD").unwrap_or_default(),
            operation: env::var("VOICEDROP_GATEWAY_OPERATION")
                .unwrap_or_else(|_| "rvm_broadcast".to_string()),
            timeout: Duration::from_secs(env_parse("VOICEDROP_GATEWAY_TIMEOUT_SECS", 30)),
        }
    }
}
