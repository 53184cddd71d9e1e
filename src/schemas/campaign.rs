use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::campaign;

/// Body of `POST /api/campaigns`. Fields are optional so a missing one is
/// reported as a validation error rather than a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub sender_id: Option<String>,
    pub receiver_numbers: Option<Vec<String>>,
    pub audio_file: Option<String>,
    pub audio_file_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignResponse {
    pub campaign_id: String,
    pub status: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResponse {
    pub id: String,
    pub user_id: i64,
    pub sender_id: String,
    pub recipient_count: i32,
    pub audio_url: String,
    pub audio_format: String,
    pub status: String,
    pub progress: i32,
    pub gateway_response: Option<String>,
    pub credits_used: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Vec<String>>,
}

impl From<campaign::Model> for CampaignResponse {
    fn from(c: campaign::Model) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            sender_id: c.sender_id,
            recipient_count: c.recipient_count,
            audio_url: c.audio_url,
            audio_format: c.audio_format,
            status: c.status,
            progress: c.progress,
            gateway_response: c.gateway_response,
            credits_used: c.credits_used,
            created_at: c.created_at,
            updated_at: c.updated_at,
            completed_at: c.completed_at,
            recipients: None,
        }
    }
}

impl CampaignResponse {
    pub fn with_recipients(mut self, recipients: Vec<String>) -> Self {
        self.recipients = Some(recipients);
        self
    }
}
