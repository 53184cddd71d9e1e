use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, QuerySelect, Set};

use crate::error::Result;
use crate::models::admin_log::{self, AdminAction};

/// One mutating admin action, ready to append to the admin log
#[derive(Debug, Clone)]
pub struct AdminLogEntry {
    pub action: AdminAction,
    pub target_user_id: Option<i64>,
    pub target_campaign_id: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl AdminLogEntry {
    pub fn for_user(action: AdminAction, user_id: i64, details: serde_json::Value) -> Self {
        Self {
            action,
            target_user_id: Some(user_id),
            target_campaign_id: None,
            details: Some(details),
        }
    }
}

/// Append an admin log row. Takes any connection so callers can write it
/// inside the same transaction as the change it describes.
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    admin_id: i64,
    entry: AdminLogEntry,
) -> Result<admin_log::Model> {
    let row = admin_log::ActiveModel {
        admin_id: Set(admin_id),
        action: Set(entry.action.to_string()),
        target_user_id: Set(entry.target_user_id),
        target_campaign_id: Set(entry.target_campaign_id),
        details: Set(entry.details.map(|d| d.to_string())),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = row.insert(conn).await?;

    tracing::info!(
        admin_id,
        action = %entry.action,
        target_user_id = ?model.target_user_id,
        "Admin action recorded"
    );

    Ok(model)
}

/// Newest-first page of the admin log
pub async fn list<C: ConnectionTrait>(
    conn: &C,
    skip: u64,
    limit: u64,
) -> Result<Vec<admin_log::Model>> {
    let logs = admin_log::Entity::find()
        .order_by_desc(admin_log::Column::CreatedAt)
        .order_by_desc(admin_log::Column::Id)
        .offset(skip)
        .limit(limit)
        .all(conn)
        .await?;

    Ok(logs)
}
