use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::auth::AuthConfig;
use crate::error::{AppError, Result};
use crate::models::user;

/// JWT token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    pub email: String,
    pub is_admin: bool,
    pub exp: i64, // Expiration time
    pub iat: i64, // Issued at
    pub jti: String,
}

struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

/// Issues and verifies HS256 bearer tokens.
///
/// Tokens are stateless: there is no revocation list, so a token stays
/// valid until `exp`.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<TokenKeys>,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            keys: Arc::new(TokenKeys {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
                ttl: Duration::hours(ttl_hours.max(1)),
            }),
        }
    }

    /// Build from configuration, generating a throwaway secret when none is set
    pub fn from_config(config: &AuthConfig) -> Self {
        match &config.jwt_secret {
            Some(secret) => Self::new(secret.as_bytes(), config.token_ttl_hours),
            None => {
                tracing::warn!(
                    "VOICEDROP_JWT_SECRET not set, generating temporary secret; tokens will not survive a restart"
                );
                let secret = generate_random_string(32);
                Self::new(secret.as_bytes(), config.token_ttl_hours)
            }
        }
    }

    /// Create a signed access token for a user
    pub fn issue(&self, user: &user::Model) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            exp: (now + self.keys.ttl).timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding).map_err(|e| e.into())
    }

    /// Decode and validate a token (signature and expiry)
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        // No clock skew tolerance for expiration check
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.keys.decoding, &validation)?;
        Ok(token_data.claims)
    }
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Generate a cryptographically secure random string (hex)
pub fn generate_random_string(length: usize) -> String {
    let bytes: Vec<u8> = (0..length).map(|_| rand::random::<u8>()).collect();
    hex::encode(bytes)
}
