//! Startup tasks: bootstrap administrator account

use sea_orm::DatabaseConnection;

use crate::config::auth::AuthConfig;
use crate::error::Result;
use crate::models::user;
use crate::schemas::normalize_email;
use crate::services::accounts::{self, NewAccount};

/// Create the configured admin account if no user holds that email yet.
///
/// Does nothing unless both `VOICEDROP_ADMIN_EMAIL` and
/// `VOICEDROP_ADMIN_PASSWORD` are set. An existing account with that email
/// is left untouched.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    config: &AuthConfig,
) -> Result<Option<user::Model>> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        tracing::debug!("No bootstrap admin configured");
        return Ok(None);
    };

    let email = normalize_email(email);
    if accounts::find_by_email(db, &email).await?.is_some() {
        tracing::debug!(email = %email, "Bootstrap admin already exists");
        return Ok(None);
    }

    let admin = accounts::create_account(
        db,
        NewAccount {
            name: config.admin_name.clone(),
            email,
            password: password.clone(),
            is_admin: true,
        },
    )
    .await?;

    tracing::info!(user_id = admin.id, email = %admin.email, "Bootstrap admin account created");
    Ok(Some(admin))
}
