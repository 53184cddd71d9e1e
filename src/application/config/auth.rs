use super::{env_opt, env_parse};

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret. A random per-process secret is used when unset.
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: i64,

    // Admin bootstrap account
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_name: String,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: env_opt("VOICEDROP_JWT_SECRET"),
            token_ttl_hours: env_parse("VOICEDROP_TOKEN_TTL_HOURS", 24),
            admin_email: env_opt("VOICEDROP_ADMIN_EMAIL"),
            admin_password: env_opt("VOICEDROP_ADMIN_PASSWORD"),
            admin_name: env_opt("VOICEDROP_ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
        }
    }
}
