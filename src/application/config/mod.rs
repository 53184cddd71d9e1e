pub mod auth;
pub mod campaigns;
pub mod database;
pub mod gateway;
pub mod rate_limit;
pub mod server;

use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub database: database::DatabaseConfig,
    pub auth: auth::AuthConfig,
    pub gateway: gateway::GatewayConfig,
    pub campaigns: campaigns::CampaignsConfig,
    pub rate_limit: rate_limit::RateLimitConfig,

    // Build info
    pub version: String,

    // Logging
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: server::ServerConfig::from_env(),
            database: database::DatabaseConfig::from_env(),
            auth: auth::AuthConfig::from_env(),
            gateway: gateway::GatewayConfig::from_env(),
            campaigns: campaigns::CampaignsConfig::from_env(),
            rate_limit: rate_limit::RateLimitConfig::from_env(),

            version: env!("CARGO_PKG_VERSION").to_string(),

            log_level: env::var("VOICEDROP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: match env::var("VOICEDROP_LOG_FORMAT")
                .map(|v| v.to_lowercase())
                .as_deref()
            {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }
}

/// Read and parse an environment variable, falling back to `default`
/// when it is unset or does not parse.
pub(crate) fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a boolean flag ("true"/"1"/"yes", case-insensitive)
pub(crate) fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Read a non-empty string variable
pub(crate) fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
