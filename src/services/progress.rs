//! Simulated campaign progress.
//!
//! This is a placeholder: the gateway reports nothing back after accepting
//! a broadcast, so progress is advanced on a timer by a random step until
//! it reaches 100. It says nothing about actual voicemail delivery.

use chrono::Utc;
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::config::campaigns::CampaignsConfig;
use crate::error::Result;
use crate::models::campaign::{self, CampaignStatus};

pub const MAX_PROGRESS: i32 = 100;

/// Result of one progress tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Progress moved to the given value, campaign still running
    Advanced(i32),
    /// Progress reached 100 and the campaign is now completed
    Completed,
    /// Campaign is gone or no longer running; the timer should stop
    Stopped,
}

/// Apply one step to a running campaign.
///
/// Every write is gated on `status = running`, so a campaign that failed or
/// completed in the meantime is left alone.
pub async fn advance<C: ConnectionTrait>(
    conn: &C,
    campaign_id: &str,
    step: i32,
) -> Result<TickOutcome> {
    let Some(current) = campaign::Entity::find_by_id(campaign_id.to_string())
        .one(conn)
        .await?
    else {
        return Ok(TickOutcome::Stopped);
    };

    if current.status != CampaignStatus::Running.as_str() {
        return Ok(TickOutcome::Stopped);
    }

    let next = (current.progress + step.max(0)).min(MAX_PROGRESS);
    let now = Utc::now();

    let mut update = campaign::Entity::update_many()
        .col_expr(campaign::Column::Progress, Expr::value(next))
        .col_expr(campaign::Column::UpdatedAt, Expr::value(now));

    if next >= MAX_PROGRESS {
        update = update
            .col_expr(
                campaign::Column::Status,
                Expr::value(CampaignStatus::Completed.as_str()),
            )
            .col_expr(campaign::Column::CompletedAt, Expr::value(Some(now)));
    }

    let result = update
        .filter(campaign::Column::Id.eq(campaign_id))
        .filter(campaign::Column::Status.eq(CampaignStatus::Running.as_str()))
        .exec(conn)
        .await?;

    Ok(match (result.rows_affected, next >= MAX_PROGRESS) {
        (0, _) => TickOutcome::Stopped,
        (_, true) => TickOutcome::Completed,
        (_, false) => TickOutcome::Advanced(next),
    })
}

/// Spawns one timer task per running campaign
#[derive(Clone)]
pub struct ProgressUpdater {
    db: DatabaseConnection,
    settings: CampaignsConfig,
}

impl ProgressUpdater {
    pub fn new(db: DatabaseConnection, settings: CampaignsConfig) -> Self {
        Self { db, settings }
    }

    fn next_step(&self) -> i32 {
        let min = self.settings.progress_min_step;
        let max = self.settings.progress_max_step.max(min);
        rand::rng().random_range(min..=max)
    }

    /// Start the timer for one campaign
    pub fn spawn(&self, campaign_id: String) -> JoinHandle<()> {
        let updater = self.clone();
        tokio::spawn(async move {
            if let Err(e) = updater.run(&campaign_id).await {
                tracing::error!(campaign_id = %campaign_id, error = %e, "Progress updater failed");
            }
        })
    }

    async fn run(&self, campaign_id: &str) -> anyhow::Result<()> {
        let mut ticker = interval(self.settings.progress_interval);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match advance(&self.db, campaign_id, self.next_step()).await? {
                TickOutcome::Advanced(progress) => {
                    tracing::debug!(campaign_id, progress, "Campaign progress advanced");
                }
                TickOutcome::Completed => {
                    tracing::info!(campaign_id, "Campaign completed");
                    return Ok(());
                }
                TickOutcome::Stopped => {
                    tracing::debug!(campaign_id, "Campaign no longer running, stopping timer");
                    return Ok(());
                }
            }
        }
    }

    /// Re-spawn timers for every campaign left `running` (e.g. after a restart)
    pub async fn resume_running(&self) -> Result<usize> {
        let running = campaign::Entity::find()
            .filter(campaign::Column::Status.eq(CampaignStatus::Running.as_str()))
            .all(&self.db)
            .await?;

        let count = running.len();
        for campaign in running {
            self.spawn(campaign.id);
        }

        if count > 0 {
            tracing::info!(count, "Resumed progress updaters for running campaigns");
        }

        Ok(count)
    }
}
