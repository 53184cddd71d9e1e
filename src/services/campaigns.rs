//! Campaign submission and lookup.
//!
//! Submission is a two-step saga: credits are reserved together with the
//! campaign and recipient rows in one transaction, then the gateway is
//! called. Acceptance moves the campaign to `running`; anything else marks
//! it `failed` and refunds the reservation in a second transaction.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::error::{AppError, Result};
use crate::models::campaign::{self, CampaignStatus};
use crate::models::campaign_recipient;
use crate::models::credit_transaction::TransactionType;
use crate::models::user;
use crate::schemas::CreateCampaignRequest;
use crate::services::credits::{self, LedgerEntry};
use crate::services::gateway::{BroadcastRequest, GatewayError, GatewayOutcome, SharedGateway};
use crate::services::progress::ProgressUpdater;

pub const CAMPAIGN_ID_PREFIX: &str = "rvm_";
pub const MIN_PHONE_DIGITS: usize = 10;
pub const MAX_PHONE_DIGITS: usize = 15;

/// Stored as the gateway response of a campaign refunded at startup
pub const ABANDONED_RESPONSE: &str = "No gateway response recorded before shutdown";

// Keeps bulk inserts under SQLite's bound-parameter limit
const RECIPIENT_INSERT_CHUNK: usize = 500;

/// Returned to the caller once the gateway accepted a campaign
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub campaign_id: String,
    pub recipients: usize,
    pub balance: i64,
}

/// Admin-side campaign filters
#[derive(Debug, Clone, Default)]
pub struct CampaignFilter {
    pub user_id: Option<i64>,
    pub status: Option<CampaignStatus>,
}

/// A phone number is 10 to 15 ASCII digits once surrounding whitespace is removed
pub fn validate_phone_number(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let valid = (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&trimmed.len())
        && trimmed.bytes().all(|b| b.is_ascii_digit());
    valid.then(|| trimmed.to_string())
}

/// Check a submission and turn it into a gateway request. Nothing is
/// written when this fails.
pub fn validate_submission(request: CreateCampaignRequest) -> Result<BroadcastRequest> {
    let missing = || AppError::BadRequest("Missing required fields".to_string());

    let sender_id = non_blank(request.sender_id).ok_or_else(missing)?;
    let audio_url = non_blank(request.audio_file).ok_or_else(missing)?;
    let audio_format = non_blank(request.audio_file_type).ok_or_else(missing)?;
    let numbers = request.receiver_numbers.ok_or_else(missing)?;

    if numbers.is_empty() {
        return Err(AppError::BadRequest(
            "At least one receiver number is required".to_string(),
        ));
    }

    let recipients = numbers
        .iter()
        .map(|n| {
            validate_phone_number(n).ok_or_else(|| {
                AppError::BadRequest(format!("Invalid phone number: {}", n.trim()))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BroadcastRequest {
        sender_id,
        recipients,
        audio_url,
        audio_format,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn generate_campaign_id() -> String {
    format!("{}{}", CAMPAIGN_ID_PREFIX, uuid::Uuid::new_v4().simple())
}

#[derive(Clone)]
pub struct CampaignService {
    db: DatabaseConnection,
    gateway: SharedGateway,
    progress: ProgressUpdater,
}

impl CampaignService {
    pub fn new(db: DatabaseConnection, gateway: SharedGateway, progress: ProgressUpdater) -> Self {
        Self {
            db,
            gateway,
            progress,
        }
    }

    /// Validate, reserve credits, call the gateway and settle.
    ///
    /// Once credits are reserved the gateway call and settlement run on their
    /// own task, so a dropped request (client disconnect) cannot leave the
    /// reservation unsettled.
    pub async fn submit(
        &self,
        user_id: i64,
        request: CreateCampaignRequest,
    ) -> Result<SubmissionReceipt> {
        let broadcast = validate_submission(request)?;
        let campaign_id = generate_campaign_id();

        let balance = self.reserve(user_id, &campaign_id, &broadcast).await?;

        tracing::info!(
            campaign_id = %campaign_id,
            user_id,
            recipients = broadcast.recipients.len(),
            balance,
            "Credits reserved, calling gateway"
        );

        let service = self.clone();
        tokio::spawn(async move {
            service
                .dispatch(user_id, campaign_id, broadcast, balance)
                .await
        })
        .await
        .map_err(|e| AppError::Internal(format!("Campaign dispatch task failed: {}", e)))?
    }

    /// Send a reserved campaign to the gateway and settle the outcome
    async fn dispatch(
        &self,
        user_id: i64,
        campaign_id: String,
        broadcast: BroadcastRequest,
        balance: i64,
    ) -> Result<SubmissionReceipt> {
        let count = broadcast.recipients.len();

        match self.gateway.broadcast(&broadcast).await {
            Ok(GatewayOutcome::Accepted(raw)) => {
                self.settle_accepted(&campaign_id, raw).await?;
                self.progress.spawn(campaign_id.clone());

                tracing::info!(campaign_id = %campaign_id, "Gateway accepted campaign");
                Ok(SubmissionReceipt {
                    campaign_id,
                    recipients: count,
                    balance,
                })
            }
            Ok(GatewayOutcome::Rejected(raw)) => {
                tracing::warn!(campaign_id = %campaign_id, response = %raw, "Gateway rejected campaign");
                self.settle_failed(user_id, &campaign_id, count as i64, raw)
                    .await?;
                Err(AppError::UpstreamFailure(
                    "Broadcast gateway rejected the campaign".to_string(),
                ))
            }
            Err(e @ GatewayError::Timeout(_)) => {
                tracing::warn!(campaign_id = %campaign_id, error = %e, "Gateway timed out");
                self.settle_failed(user_id, &campaign_id, count as i64, e.to_string())
                    .await?;
                Err(AppError::GatewayTimeout(
                    "Broadcast gateway did not respond in time".to_string(),
                ))
            }
            Err(e @ GatewayError::Transport(_)) => {
                tracing::error!(campaign_id = %campaign_id, error = %e, "Gateway unreachable");
                self.settle_failed(user_id, &campaign_id, count as i64, e.to_string())
                    .await?;
                Err(AppError::UpstreamFailure(
                    "Broadcast gateway is unavailable".to_string(),
                ))
            }
        }
    }

    /// Fail and refund every campaign still `pending`.
    ///
    /// Only safe at startup: a `pending` campaign then belongs to a process
    /// that died before the gateway answered.
    pub async fn recover_pending(&self) -> Result<usize> {
        let stale = campaign::Entity::find()
            .filter(campaign::Column::Status.eq(CampaignStatus::Pending.as_str()))
            .all(&self.db)
            .await?;

        let count = stale.len();
        for abandoned in stale {
            self.settle_failed(
                abandoned.user_id,
                &abandoned.id,
                abandoned.credits_used,
                ABANDONED_RESPONSE.to_string(),
            )
            .await?;
        }

        if count > 0 {
            tracing::warn!(count, "Refunded campaigns abandoned before the gateway answered");
        }
        Ok(count)
    }

    /// Debit credits and write the campaign, its recipients and the usage
    /// ledger row in one transaction. Returns the balance after the debit.
    async fn reserve(
        &self,
        user_id: i64,
        campaign_id: &str,
        broadcast: &BroadcastRequest,
    ) -> Result<i64> {
        let count = broadcast.recipients.len();
        let txn = self.db.begin().await?;

        // The conditional debit is the first statement so the transaction
        // takes the write lock up front.
        let debited = credits::debit(
            &txn,
            user_id,
            count as i64,
            LedgerEntry::new(TransactionType::Usage)
                .campaign(campaign_id)
                .description(format!("Campaign to {} recipients", count)),
        )
        .await?;

        let owner = user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !owner.is_active {
            return Err(AppError::Forbidden("Account is disabled".to_string()));
        }

        let balance =
            debited.ok_or_else(|| AppError::BadRequest("Insufficient credits".to_string()))?;

        let now = Utc::now();
        campaign::ActiveModel {
            id: Set(campaign_id.to_string()),
            user_id: Set(user_id),
            sender_id: Set(broadcast.sender_id.clone()),
            recipient_count: Set(count as i32),
            audio_url: Set(broadcast.audio_url.clone()),
            audio_format: Set(broadcast.audio_format.clone()),
            status: Set(CampaignStatus::Pending.to_string()),
            progress: Set(0),
            gateway_response: Set(None),
            credits_used: Set(count as i64),
            created_at: Set(now),
            updated_at: Set(now),
            completed_at: Set(None),
        }
        .insert(&txn)
        .await?;

        for chunk in broadcast.recipients.chunks(RECIPIENT_INSERT_CHUNK) {
            let rows = chunk.iter().map(|phone| campaign_recipient::ActiveModel {
                campaign_id: Set(campaign_id.to_string()),
                phone_number: Set(phone.clone()),
                status: Set("pending".to_string()),
                created_at: Set(now),
                ..Default::default()
            });
            campaign_recipient::Entity::insert_many(rows)
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(balance)
    }

    /// `pending → running`, storing the raw gateway answer
    async fn settle_accepted(&self, campaign_id: &str, raw: String) -> Result<()> {
        let result = campaign::Entity::update_many()
            .col_expr(
                campaign::Column::Status,
                Expr::value(CampaignStatus::Running.as_str()),
            )
            .col_expr(campaign::Column::GatewayResponse, Expr::value(Some(raw)))
            .col_expr(campaign::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(campaign::Column::Id.eq(campaign_id))
            .filter(campaign::Column::Status.eq(CampaignStatus::Pending.as_str()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            tracing::warn!(campaign_id, "Campaign was not pending when gateway accepted it");
        }

        Ok(())
    }

    /// `pending → failed` plus refund, in one transaction. The refund is only
    /// written when this call actually performed the transition.
    async fn settle_failed(
        &self,
        user_id: i64,
        campaign_id: &str,
        amount: i64,
        raw: String,
    ) -> Result<()> {
        let txn = self.db.begin().await?;

        let result = campaign::Entity::update_many()
            .col_expr(
                campaign::Column::Status,
                Expr::value(CampaignStatus::Failed.as_str()),
            )
            .col_expr(campaign::Column::GatewayResponse, Expr::value(Some(raw)))
            .col_expr(campaign::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(campaign::Column::Id.eq(campaign_id))
            .filter(campaign::Column::Status.eq(CampaignStatus::Pending.as_str()))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            tracing::warn!(campaign_id, "Campaign already settled, skipping refund");
            txn.rollback().await?;
            return Ok(());
        }

        let balance = credits::credit(
            &txn,
            user_id,
            amount,
            LedgerEntry::new(TransactionType::Refund)
                .campaign(campaign_id)
                .description("Refund for failed campaign"),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(campaign_id, user_id, amount, balance, "Credits refunded");
        Ok(())
    }

    /// Newest-first page of one user's campaigns
    pub async fn list_for_user(
        &self,
        user_id: i64,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<campaign::Model>> {
        self.list(
            CampaignFilter {
                user_id: Some(user_id),
                status: None,
            },
            skip,
            limit,
        )
        .await
    }

    pub async fn list(
        &self,
        filter: CampaignFilter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<campaign::Model>> {
        let mut select = campaign::Entity::find();

        if let Some(user_id) = filter.user_id {
            select = select.filter(campaign::Column::UserId.eq(user_id));
        }
        if let Some(status) = filter.status {
            select = select.filter(campaign::Column::Status.eq(status.as_str()));
        }

        let campaigns = select
            .order_by_desc(campaign::Column::CreatedAt)
            .order_by_desc(campaign::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(campaigns)
    }

    /// One of the caller's campaigns with its recipient numbers. Another
    /// user's campaign is reported as not found.
    pub async fn find_for_user(
        &self,
        user_id: i64,
        campaign_id: &str,
    ) -> Result<(campaign::Model, Vec<String>)> {
        let campaign = campaign::Entity::find_by_id(campaign_id.to_string())
            .filter(campaign::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))?;

        let recipients = campaign_recipient::Entity::find()
            .filter(campaign_recipient::Column::CampaignId.eq(campaign_id))
            .order_by_asc(campaign_recipient::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|r| r.phone_number)
            .collect();

        Ok((campaign, recipients))
    }
}
