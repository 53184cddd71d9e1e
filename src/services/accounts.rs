//! Account creation and credential checks

use chrono::Utc;
use once_cell::sync::Lazy;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr, TransactionTrait,
};

use crate::error::{AppError, Result};
use crate::models::credit_transaction::TransactionType;
use crate::models::user::{self, STARTING_CREDITS};
use crate::schemas::normalize_email;
use crate::services::credits::{self, LedgerEntry};
use crate::services::security::{hash_password, verify_password};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

// Checked against on unknown emails so both failure paths pay the bcrypt cost
static DUMMY_HASH: Lazy<String> =
    Lazy::new(|| hash_password("voicedrop-unknown-account").unwrap_or_default());

/// Fields for a new account. The email must already be normalized.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
}

/// Create an account with the starting grant. The user row and the
/// `bonus` ledger row are written in one transaction.
pub async fn create_account(db: &DatabaseConnection, account: NewAccount) -> Result<user::Model> {
    let hashed_password = hash_password(&account.password)?;
    let now = Utc::now();

    let txn = db.begin().await?;

    let created = user::ActiveModel {
        name: Set(account.name),
        email: Set(account.email),
        hashed_password: Set(hashed_password),
        credits: Set(0),
        is_admin: Set(account.is_admin),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(map_unique_violation)?;

    let balance = credits::credit(
        &txn,
        created.id,
        STARTING_CREDITS,
        LedgerEntry::new(TransactionType::Bonus).description("Welcome credits"),
    )
    .await?;

    txn.commit().await?;

    tracing::info!(user_id = created.id, email = %created.email, "Account created");

    Ok(user::Model {
        credits: balance,
        ..created
    })
}

fn map_unique_violation(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Email already registered".to_string())
        }
        _ => AppError::Database(e),
    }
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
    let found = user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?;
    Ok(found)
}

/// Check credentials. Unknown email and wrong password produce the same
/// error; a disabled account is only revealed to a caller holding the
/// correct password.
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<user::Model> {
    let Some(found) = find_by_email(db, email).await? else {
        verify_password(password, &DUMMY_HASH);
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(password, &found.hashed_password) {
        tracing::debug!(user_id = found.id, "Password mismatch");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    if !found.is_active {
        return Err(AppError::Forbidden("Account is disabled".to_string()));
    }

    Ok(found)
}

pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
