//! Credit ledger. Every balance change is a conditional UPDATE on the user
//! row followed by a ledger row; callers pass a transaction so both land
//! together or not at all.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::error::{AppError, Result};
use crate::models::credit_transaction::{self, TransactionType};
use crate::models::user;

/// Describes why a balance changed
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub kind: TransactionType,
    pub campaign_id: Option<String>,
    pub description: Option<String>,
}

impl LedgerEntry {
    pub fn new(kind: TransactionType) -> Self {
        Self {
            kind,
            campaign_id: None,
            description: None,
        }
    }

    pub fn campaign(mut self, campaign_id: impl Into<String>) -> Self {
        self.campaign_id = Some(campaign_id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Take `amount` credits from a user if the balance covers it.
///
/// Returns the new balance, or `None` when the balance is too low (or the
/// user does not exist). Nothing is written in the `None` case.
pub async fn debit<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    amount: i64,
    entry: LedgerEntry,
) -> Result<Option<i64>> {
    if amount <= 0 {
        return Err(AppError::BadRequest(
            "Debit amount must be positive".to_string(),
        ));
    }

    let result = user::Entity::update_many()
        .col_expr(
            user::Column::Credits,
            Expr::col(user::Column::Credits).sub(amount),
        )
        .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::Credits.gte(amount))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }

    let balance = current_balance(conn, user_id).await?;
    append(conn, user_id, -amount, balance, entry).await?;

    Ok(Some(balance))
}

/// Give `amount` credits to a user. Returns the new balance.
pub async fn credit<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    amount: i64,
    entry: LedgerEntry,
) -> Result<i64> {
    if amount <= 0 {
        return Err(AppError::BadRequest(
            "Credit amount must be positive".to_string(),
        ));
    }

    let result = user::Entity::update_many()
        .col_expr(
            user::Column::Credits,
            Expr::col(user::Column::Credits).add(amount),
        )
        .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(user::Column::Id.eq(user_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let balance = current_balance(conn, user_id).await?;
    append(conn, user_id, amount, balance, entry).await?;

    Ok(balance)
}

/// Apply a signed admin adjustment. Zero is rejected and a negative amount
/// may not take the balance below zero.
pub async fn adjust<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    amount: i64,
    entry: LedgerEntry,
) -> Result<i64> {
    match amount {
        0 => Err(AppError::BadRequest("Amount must not be zero".to_string())),
        a if a > 0 => credit(conn, user_id, a, entry).await,
        a => debit(conn, user_id, -a, entry).await?.ok_or_else(|| {
            AppError::BadRequest("Adjustment would make the balance negative".to_string())
        }),
    }
}

/// Newest-first page of a user's ledger
pub async fn list_transactions<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    skip: u64,
    limit: u64,
) -> Result<Vec<credit_transaction::Model>> {
    let rows = credit_transaction::Entity::find()
        .filter(credit_transaction::Column::UserId.eq(user_id))
        .order_by_desc(credit_transaction::Column::CreatedAt)
        .order_by_desc(credit_transaction::Column::Id)
        .offset(skip)
        .limit(limit)
        .all(conn)
        .await?;

    Ok(rows)
}

/// Insert a ledger row for a change that has already been applied
pub async fn append<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    amount: i64,
    balance_after: i64,
    entry: LedgerEntry,
) -> Result<credit_transaction::Model> {
    let row = credit_transaction::ActiveModel {
        user_id: Set(user_id),
        transaction_type: Set(entry.kind.to_string()),
        amount: Set(amount),
        balance_after: Set(balance_after),
        campaign_id: Set(entry.campaign_id),
        description: Set(entry.description),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let model = row.insert(conn).await?;

    tracing::debug!(
        user_id,
        amount,
        balance_after,
        kind = %entry.kind,
        "Ledger entry appended"
    );

    Ok(model)
}

async fn current_balance<C: ConnectionTrait>(conn: &C, user_id: i64) -> Result<i64> {
    user::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .map(|u| u.credits)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
