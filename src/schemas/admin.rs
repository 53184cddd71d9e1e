use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{admin_log, credit_transaction};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjustCreditsRequest {
    pub amount: i64,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub description: Option<String>,
}

/// `GET /api/admin/campaigns` filters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignQuery {
    pub user_id: Option<i64>,
    pub status: Option<String>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditTransactionResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub amount: i64,
    pub balance_after: i64,
    pub campaign_id: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<credit_transaction::Model> for CreditTransactionResponse {
    fn from(t: credit_transaction::Model) -> Self {
        Self {
            id: t.id,
            transaction_type: t.transaction_type,
            amount: t.amount,
            balance_after: t.balance_after,
            campaign_id: t.campaign_id,
            description: t.description,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLogResponse {
    pub id: i64,
    pub admin_id: i64,
    pub action: String,
    pub target_user_id: Option<i64>,
    pub target_campaign_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<admin_log::Model> for AdminLogResponse {
    fn from(log: admin_log::Model) -> Self {
        Self {
            id: log.id,
            admin_id: log.admin_id,
            action: log.action,
            target_user_id: log.target_user_id,
            target_campaign_id: log.target_campaign_id,
            details: log
                .details
                .and_then(|d| serde_json::from_str(&d).ok()),
            created_at: log.created_at,
        }
    }
}
