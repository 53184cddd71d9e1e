//! Authorization extractors
//!
//! Usage in handlers:
//! ```ignore
//! async fn list_users(
//!     AdminOnly(admin): AdminOnly,
//!     State(state): State<AppState>,
//! ) -> Result<Json<Vec<AdminUserResponse>>> {
//!     // Admin flag already verified
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::middleware::auth::{AuthenticatedUser, Identity};

fn identity_from(parts: &Parts) -> Result<Identity, AppError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .map(|u| u.0.clone())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

/// Extractor for any authenticated caller
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl Authenticated {
    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from(parts).map(Authenticated)
    }
}

/// Extractor that requires the admin flag on the caller's token
///
/// Returns 403 Forbidden for authenticated non-admins.
#[derive(Debug, Clone)]
pub struct AdminOnly(pub Identity);

impl AdminOnly {
    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }
}

impl<S> FromRequestParts<S> for AdminOnly
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = identity_from(parts)?;

        if !identity.is_admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminOnly(identity))
    }
}
