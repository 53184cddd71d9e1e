//! Authentication middleware for protected API routes
//!
//! Requires a valid Bearer token. The decoded identity is stored in the
//! request extensions for handlers and extractors.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::services::security::Claims;
use crate::state::AppState;

/// Identity carried by a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub email: String,
    pub is_admin: bool,
}

impl TryFrom<Claims> for Identity {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = claims
            .sub
            .parse()
            .map_err(|_| AppError::Forbidden("Invalid or expired token".to_string()))?;

        Ok(Self {
            user_id,
            email: claims.email,
            is_admin: claims.is_admin,
        })
    }
}

/// Authenticated identity stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

/// Auth middleware that validates Bearer tokens
///
/// Returns 401 when no token is presented and 403 when the token fails
/// signature or expiry checks.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = match extract_bearer_token(&req) {
        Some(t) => t,
        None => {
            return AppError::Unauthorized("Access token required".to_string()).into_response();
        }
    };

    let identity = match state
        .tokens
        .verify(&token)
        .and_then(Identity::try_from)
    {
        Ok(identity) => identity,
        Err(e) => return e.into_response(),
    };

    req.extensions_mut().insert(AuthenticatedUser(identity));

    next.run(req).await
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(req: &Request) -> Option<String> {
    let auth_header = req.headers().get(AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}
