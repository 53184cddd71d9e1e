use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, QuerySelect, Set, TransactionTrait};
use serde_json::json;

use crate::error::{AppError, Result};
use crate::middleware::AdminOnly;
use crate::models::admin_log::AdminAction;
use crate::models::campaign::CampaignStatus;
use crate::models::credit_transaction::TransactionType;
use crate::models::prelude::*;
use crate::schemas::{
    page_bounds, AdjustCreditsRequest, AdminLogResponse, AdminUserResponse, CampaignQuery,
    CampaignResponse, CreditTransactionResponse, PageQuery, UpdateUserRequest,
};
use crate::services::accounts;
use crate::services::admin_log::{self, AdminLogEntry};
use crate::services::campaigns::CampaignFilter;
use crate::services::credits::{self, LedgerEntry};
use crate::state::AppState;

/// Admin management routes
pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{user_id}", get(get_user).patch(update_user))
        .route("/users/{user_id}/credits", post(adjust_credits))
        .route("/users/{user_id}/transactions", get(list_transactions))
        .route("/campaigns", get(list_campaigns))
        .route("/logs", get(list_logs))
        .with_state(state)
}

async fn list_users(
    State(state): State<AppState>,
    _admin: AdminOnly,
    page: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<AdminUserResponse>>> {
    let Query(page) = page?;
    let (skip, limit) = page.bounds();

    let users = User::find()
        .order_by_asc(user::Column::Id)
        .offset(skip)
        .limit(limit)
        .all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(AdminUserResponse::from).collect()))
}

async fn get_user(
    State(state): State<AppState>,
    _admin: AdminOnly,
    user_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<AdminUserResponse>> {
    let Path(user_id) = user_id?;
    let found = accounts::get_user(&state.db, user_id).await?;
    Ok(Json(found.into()))
}

/// Edit name and flags. Admins may not deactivate or demote themselves.
async fn update_user(
    State(state): State<AppState>,
    admin: AdminOnly,
    user_id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<AdminUserResponse>> {
    let Path(user_id) = user_id?;
    let Json(data) = payload?;

    if data.name.is_none() && data.is_active.is_none() && data.is_admin.is_none() {
        return Err(AppError::BadRequest("No changes supplied".to_string()));
    }
    if user_id == admin.user_id() && data.is_active == Some(false) {
        return Err(AppError::BadRequest(
            "You cannot deactivate your own account".to_string(),
        ));
    }
    if user_id == admin.user_id() && data.is_admin == Some(false) {
        return Err(AppError::BadRequest(
            "You cannot remove your own admin rights".to_string(),
        ));
    }

    let name = match data.name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::BadRequest("Name must not be empty".to_string())),
        other => other.map(String::from),
    };

    let txn = state.db.begin().await?;

    let existing = User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let before = json!({
        "name": existing.name,
        "isActive": existing.is_active,
        "isAdmin": existing.is_admin,
    });

    let mut model: user::ActiveModel = existing.into();
    if let Some(name) = name {
        model.name = Set(name);
    }
    if let Some(is_active) = data.is_active {
        model.is_active = Set(is_active);
    }
    if let Some(is_admin) = data.is_admin {
        model.is_admin = Set(is_admin);
    }
    model.updated_at = Set(Utc::now());

    let updated = model.update(&txn).await?;

    admin_log::record(
        &txn,
        admin.user_id(),
        AdminLogEntry::for_user(
            AdminAction::UserUpdated,
            user_id,
            json!({
                "before": before,
                "after": {
                    "name": updated.name,
                    "isActive": updated.is_active,
                    "isAdmin": updated.is_admin,
                },
            }),
        ),
    )
    .await?;

    txn.commit().await?;

    Ok(Json(updated.into()))
}

/// Resolve the ledger type for an admin adjustment
fn adjustment_type(requested: Option<&str>, amount: i64) -> Result<TransactionType> {
    match requested {
        None if amount < 0 => Ok(TransactionType::Adjustment),
        None => Ok(TransactionType::Purchase),
        Some(raw) => match TransactionType::parse(raw) {
            Some(TransactionType::Usage) | None => Err(AppError::BadRequest(format!(
                "Invalid transaction type: {}",
                raw
            ))),
            Some(kind) => Ok(kind),
        },
    }
}

/// Signed balance change with ledger row and admin log in one transaction
async fn adjust_credits(
    State(state): State<AppState>,
    admin: AdminOnly,
    user_id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<AdjustCreditsRequest>, JsonRejection>,
) -> Result<Json<AdminUserResponse>> {
    let Path(user_id) = user_id?;
    let Json(data) = payload?;

    if data.amount == 0 {
        return Err(AppError::BadRequest("Amount must not be zero".to_string()));
    }
    let kind = adjustment_type(data.transaction_type.as_deref(), data.amount)?;

    // Existence first so a missing user is a 404 rather than an overdraw
    accounts::get_user(&state.db, user_id).await?;

    let description = data
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("Admin {} by user {}", kind, admin.user_id()));

    let txn = state.db.begin().await?;

    let balance = credits::adjust(
        &txn,
        user_id,
        data.amount,
        LedgerEntry::new(kind).description(description.clone()),
    )
    .await?;

    admin_log::record(
        &txn,
        admin.user_id(),
        AdminLogEntry::for_user(
            AdminAction::CreditsAdjusted,
            user_id,
            json!({
                "amount": data.amount,
                "type": kind.to_string(),
                "description": description,
                "balanceAfter": balance,
            }),
        ),
    )
    .await?;

    txn.commit().await?;

    tracing::info!(
        admin_id = admin.user_id(),
        user_id,
        amount = data.amount,
        balance,
        "Credits adjusted"
    );

    let updated = accounts::get_user(&state.db, user_id).await?;
    Ok(Json(updated.into()))
}

async fn list_transactions(
    State(state): State<AppState>,
    _admin: AdminOnly,
    user_id: std::result::Result<Path<i64>, PathRejection>,
    page: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<CreditTransactionResponse>>> {
    let Path(user_id) = user_id?;
    let Query(page) = page?;
    accounts::get_user(&state.db, user_id).await?;

    let (skip, limit) = page.bounds();
    let rows = credits::list_transactions(&state.db, user_id, skip, limit).await?;

    Ok(Json(
        rows.into_iter()
            .map(CreditTransactionResponse::from)
            .collect(),
    ))
}

async fn list_campaigns(
    State(state): State<AppState>,
    _admin: AdminOnly,
    query: std::result::Result<Query<CampaignQuery>, QueryRejection>,
) -> Result<Json<Vec<CampaignResponse>>> {
    let Query(query) = query?;
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(CampaignStatus::parse(raw).ok_or_else(|| {
            AppError::BadRequest(format!("Invalid status filter: {}", raw))
        })?),
    };

    let (skip, limit) = page_bounds(query.skip, query.limit);
    let campaigns = state
        .campaigns
        .list(
            CampaignFilter {
                user_id: query.user_id,
                status,
            },
            skip,
            limit,
        )
        .await?;

    Ok(Json(campaigns.into_iter().map(CampaignResponse::from).collect()))
}

async fn list_logs(
    State(state): State<AppState>,
    _admin: AdminOnly,
    page: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<AdminLogResponse>>> {
    let Query(page) = page?;
    let (skip, limit) = page.bounds();
    let logs = admin_log::list(&state.db, skip, limit).await?;

    Ok(Json(logs.into_iter().map(AdminLogResponse::from).collect()))
}
