//! Test helpers for unit tests: in-memory database and seeded rows.

use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

use crate::migrations::Migrator;
use crate::models::campaign::{self, CampaignStatus};
use crate::models::user;

/// Create an in-memory SQLite database with all migrations applied
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Insert a user row directly (no password hashing, no ledger row)
pub async fn create_test_user(db: &DatabaseConnection, email: &str, credits: i64) -> user::Model {
    let now = chrono::Utc::now();
    user::ActiveModel {
        name: Set(email.split('@').next().unwrap_or("user").to_string()),
        email: Set(email.to_string()),
        hashed_password: Set("not-a-real-hash".to_string()),
        credits: Set(credits),
        is_admin: Set(false),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test user")
}

/// Insert a campaign row with the given status and no recipients
pub async fn create_test_campaign(
    db: &DatabaseConnection,
    user_id: i64,
    status: CampaignStatus,
) -> campaign::Model {
    let now = chrono::Utc::now();
    campaign::ActiveModel {
        id: Set(format!("rvm_{}", uuid::Uuid::new_v4().simple())),
        user_id: Set(user_id),
        sender_id: Set("5551234567".to_string()),
        recipient_count: Set(1),
        audio_url: Set("https://cdn.example.com/drop.mp3".to_string()),
        audio_format: Set("mp3".to_string()),
        status: Set(status.to_string()),
        progress: Set(0),
        gateway_response: Set(None),
        credits_used: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
        completed_at: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to create test campaign")
}
