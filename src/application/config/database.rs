use std::env;

use super::env_parse;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    /// Pool ceiling. In-memory SQLite is always a single connection.
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("VOICEDROP_DATABASE_URL")
                .or_else(|_| env::var("DATABASE_URL"))
                .unwrap_or_else(|_| "sqlite://voicedrop.db?mode=rwc".to_string()),
            max_connections: env_parse("VOICEDROP_DATABASE_MAX_CONNECTIONS", 10).max(1),
        }
    }
}
