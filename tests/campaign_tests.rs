//! Campaign submission integration tests
//!
//! Covers:
//! - POST /api/campaigns: validation, credit reservation, gateway settlement
//! - GET  /api/campaigns and /api/campaigns/{id}: ownership
//! - progress timer driving an accepted campaign to completion
//! - settlement of requests dropped mid-flight and startup recovery

use std::time::Duration;

use axum::http::StatusCode;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

mod common;
use common::{
    balance_of, build_app_state, build_app_state_with, campaign_body, create_test_db,
    create_test_user, fast_progress, idle_progress, register, send, FakeBehavior, FakeGateway,
};

use voicedrop::models::{campaign, campaign_recipient, credit_transaction, user};
use voicedrop::services::campaigns::ABANDONED_RESPONSE;
use voicedrop::state::AppState;

async fn campaign_count(state: &AppState) -> u64 {
    campaign::Entity::find().count(&state.db).await.unwrap()
}

async fn load_campaign(state: &AppState, id: &str) -> campaign::Model {
    campaign::Entity::find_by_id(id.to_string())
        .one(&state.db)
        .await
        .unwrap()
        .unwrap()
}

async fn ledger_for(state: &AppState, user_id: i64) -> Vec<credit_transaction::Model> {
    credit_transaction::Entity::find()
        .filter(credit_transaction::Column::UserId.eq(user_id))
        .all(&state.db)
        .await
        .unwrap()
}

async fn set_credits(state: &AppState, user_id: i64, credits: i64) {
    let found = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await
        .unwrap()
        .unwrap();
    let mut model: user::ActiveModel = found.into();
    model.credits = Set(credits);
    model.update(&state.db).await.unwrap();
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_submit_debits_one_credit_per_recipient() {
    let gateway = FakeGateway::accepting();
    let state = build_app_state_with(create_test_db().await, gateway.clone(), idle_progress());
    let (token, user_id) = register(&state, "sender@example.com").await;

    let (status, body) = send(
        &state,
        "POST",
        "/api/campaigns",
        Some(&token),
        Some(campaign_body(&["5550000001", "5550000002", " 5550000003 "])),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    assert_eq!(body["status"], "success");
    assert!(body["message"].as_str().unwrap().contains('3'));

    let campaign_id = body["campaignId"].as_str().unwrap();
    assert!(campaign_id.starts_with("rvm_"));

    assert_eq!(balance_of(&state, user_id).await, 97);

    let stored = load_campaign(&state, campaign_id).await;
    assert_eq!(stored.status, "running");
    assert_eq!(stored.recipient_count, 3);
    assert_eq!(stored.credits_used, 3);
    assert_eq!(stored.user_id, user_id);
    assert!(stored.gateway_response.unwrap().contains("SENT OK"));

    let recipients = campaign_recipient::Entity::find()
        .filter(campaign_recipient::Column::CampaignId.eq(campaign_id))
        .all(&state.db)
        .await
        .unwrap();
    assert_eq!(recipients.len(), 3);
    assert!(recipients.iter().all(|r| r.status == "pending"));

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].recipients,
        vec!["5550000001", "5550000002", "5550000003"]
    );
    assert_eq!(calls[0].sender_id, "5551234567");

    let usage: Vec<_> = ledger_for(&state, user_id)
        .await
        .into_iter()
        .filter(|t| t.transaction_type == "usage")
        .collect();
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].amount, -3);
    assert_eq!(usage[0].balance_after, 97);
    assert_eq!(usage[0].campaign_id.as_deref(), Some(campaign_id));
}

#[tokio::test]
async fn test_accepted_campaign_progresses_to_completed() {
    let state = build_app_state_with(
        create_test_db().await,
        FakeGateway::accepting(),
        fast_progress(),
    );
    let (token, _) = register(&state, "progress@example.com").await;

    let (status, body) = send(
        &state,
        "POST",
        "/api/campaigns",
        Some(&token),
        Some(campaign_body(&["5550000001"])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let campaign_id = body["campaignId"].as_str().unwrap().to_string();

    let mut finished = None;
    for _ in 0..200 {
        let current = load_campaign(&state, &campaign_id).await;
        if current.status == "completed" {
            finished = Some(current);
            break;
        }
        assert!(current.progress <= 100);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let finished = finished.expect("campaign never completed");
    assert_eq!(finished.progress, 100);
    assert!(finished.completed_at.is_some());
}

// ============================================================================
// Validation and reservation failures
// ============================================================================

#[tokio::test]
async fn test_insufficient_credits_writes_nothing() {
    let gateway = FakeGateway::accepting();
    let state = build_app_state_with(create_test_db().await, gateway.clone(), idle_progress());
    let (token, user_id) = register(&state, "poor@example.com").await;
    set_credits(&state, user_id, 2).await;

    let (status, body) = send(
        &state,
        "POST",
        "/api/campaigns",
        Some(&token),
        Some(campaign_body(&["5550000001", "5550000002", "5550000003"])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Insufficient credits");
    assert_eq!(balance_of(&state, user_id).await, 2);
    assert_eq!(campaign_count(&state).await, 0);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_phone_number_rejects_whole_submission() {
    let gateway = FakeGateway::accepting();
    let state = build_app_state_with(create_test_db().await, gateway.clone(), idle_progress());
    let (token, user_id) = register(&state, "typo@example.com").await;

    let (status, body) = send(
        &state,
        "POST",
        "/api/campaigns",
        Some(&token),
        Some(campaign_body(&["5550000001", "555-000-0002", "5550000003"])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid phone number: 555-000-0002");
    assert_eq!(balance_of(&state, user_id).await, 100);
    assert_eq!(campaign_count(&state).await, 0);
    assert_eq!(
        campaign_recipient::Entity::find().count(&state.db).await.unwrap(),
        0
    );
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_missing_fields_and_empty_list() {
    let state = build_app_state(create_test_db().await);
    let (token, _) = register(&state, "fields@example.com").await;

    let mut missing_sender = campaign_body(&["5550000001"]);
    missing_sender.as_object_mut().unwrap().remove("senderId");

    for payload in [missing_sender, campaign_body(&[])] {
        let (status, _) = send(&state, "POST", "/api/campaigns", Some(&token), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    assert_eq!(campaign_count(&state).await, 0);
}

#[tokio::test]
async fn test_submit_requires_token() {
    let state = build_app_state(create_test_db().await);

    let (status, _) = send(
        &state,
        "POST",
        "/api/campaigns",
        None,
        Some(campaign_body(&["5550000001"])),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_disabled_account_cannot_submit() {
    let state = build_app_state(create_test_db().await);
    let (created, token) = create_test_user(&state, "off@example.com", false).await;

    let mut model: user::ActiveModel = created.clone().into();
    model.is_active = Set(false);
    model.update(&state.db).await.unwrap();

    let (status, _) = send(
        &state,
        "POST",
        "/api/campaigns",
        Some(&token),
        Some(campaign_body(&["5550000001"])),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(balance_of(&state, created.id).await, 100);
    assert_eq!(campaign_count(&state).await, 0);
}

// ============================================================================
// Gateway failures are compensated
// ============================================================================

async fn assert_refunded(state: &AppState, user_id: i64, campaign_id: &str) {
    assert_eq!(balance_of(state, user_id).await, 100);

    let stored = load_campaign(state, campaign_id).await;
    assert_eq!(stored.status, "failed");
    assert!(stored.gateway_response.is_some());

    let ledger: Vec<_> = ledger_for(state, user_id)
        .await
        .into_iter()
        .filter(|t| t.campaign_id.as_deref() == Some(campaign_id))
        .collect();
    assert_eq!(ledger.len(), 2);
    assert!(ledger.iter().any(|t| t.transaction_type == "usage"));
    assert!(ledger.iter().any(|t| t.transaction_type == "refund"));
    assert_eq!(ledger.iter().map(|t| t.amount).sum::<i64>(), 0);
}

async fn only_campaign_id(state: &AppState) -> String {
    let all = campaign::Entity::find().all(&state.db).await.unwrap();
    assert_eq!(all.len(), 1);
    all[0].id.clone()
}

#[tokio::test]
async fn test_gateway_rejection_refunds_and_returns_502() {
    let gateway = FakeGateway::new(FakeBehavior::Reject("ERROR: invalid caller id".to_string()));
    let state = build_app_state_with(create_test_db().await, gateway, idle_progress());
    let (token, user_id) = register(&state, "rejected@example.com").await;

    let (status, body) = send(
        &state,
        "POST",
        "/api/campaigns",
        Some(&token),
        Some(campaign_body(&["5550000001", "5550000002"])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());

    let campaign_id = only_campaign_id(&state).await;
    assert_refunded(&state, user_id, &campaign_id).await;
    assert_eq!(
        load_campaign(&state, &campaign_id).await.gateway_response.as_deref(),
        Some("ERROR: invalid caller id")
    );
}

#[tokio::test]
async fn test_gateway_timeout_refunds_and_returns_504() {
    let gateway = FakeGateway::new(FakeBehavior::Timeout);
    let state = build_app_state_with(create_test_db().await, gateway, idle_progress());
    let (token, user_id) = register(&state, "slow@example.com").await;

    let (status, _) = send(
        &state,
        "POST",
        "/api/campaigns",
        Some(&token),
        Some(campaign_body(&["5550000001"])),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    let campaign_id = only_campaign_id(&state).await;
    assert_refunded(&state, user_id, &campaign_id).await;
}

#[tokio::test]
async fn test_gateway_transport_error_refunds_and_returns_502() {
    let gateway = FakeGateway::new(FakeBehavior::Transport);
    let state = build_app_state_with(create_test_db().await, gateway, idle_progress());
    let (token, user_id) = register(&state, "down@example.com").await;

    let (status, _) = send(
        &state,
        "POST",
        "/api/campaigns",
        Some(&token),
        Some(campaign_body(&["5550000001"])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let campaign_id = only_campaign_id(&state).await;
    assert_refunded(&state, user_id, &campaign_id).await;
}

// ============================================================================
// Concurrency
// ============================================================================

// In-memory SQLite gives the pool a single connection, so these
// reservations queue on the pool rather than interleave inside the
// database. The guarantee itself is the conditional debit
// (`credits >= n` in the UPDATE), covered in services::credits.
#[tokio::test]
async fn test_concurrent_submissions_never_overdraw() {
    let state = build_app_state(create_test_db().await);
    let (token, user_id) = register(&state, "race@example.com").await;

    let numbers: Vec<String> = (0..10).map(|i| format!("555000{:04}", i)).collect();
    let mut handles = Vec::new();
    for _ in 0..15 {
        let state = state.clone();
        let token = token.clone();
        let refs: Vec<&str> = numbers.iter().map(String::as_str).collect();
        let body = campaign_body(&refs);
        handles.push(tokio::spawn(async move {
            send(&state, "POST", "/api/campaigns", Some(&token), Some(body))
                .await
                .0
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => accepted += 1,
            StatusCode::BAD_REQUEST => {}
            other => panic!("unexpected status {other}"),
        }
    }

    let balance = balance_of(&state, user_id).await;
    assert!(balance >= 0);
    assert_eq!(accepted, 10);
    assert_eq!(100 - balance, accepted * 10);
    assert_eq!(campaign_count(&state).await, accepted as u64);
}

// ============================================================================
// Listing and ownership
// ============================================================================

#[tokio::test]
async fn test_list_and_get_own_campaigns() {
    let state = build_app_state(create_test_db().await);
    let (token, _) = register(&state, "owner@example.com").await;
    let (other_token, _) = register(&state, "other@example.com").await;

    let (_, body) = send(
        &state,
        "POST",
        "/api/campaigns",
        Some(&token),
        Some(campaign_body(&["5550000001", "5550000002"])),
    )
    .await;
    let campaign_id = body["campaignId"].as_str().unwrap().to_string();

    let (status, list) = send(&state, "GET", "/api/campaigns", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], campaign_id.as_str());
    assert_eq!(list[0]["recipientCount"], 2);

    let (status, detail) = send(
        &state,
        "GET",
        &format!("/api/campaigns/{}", campaign_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["recipients"], serde_json::json!(["5550000001", "5550000002"]));

    let (status, other_list) = send(&state, "GET", "/api/campaigns", Some(&other_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(other_list.as_array().unwrap().is_empty());

    let (status, _) = send(
        &state,
        "GET",
        &format!("/api/campaigns/{}", campaign_id),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bad_query_string_is_json_error() {
    let state = build_app_state(create_test_db().await);
    let (token, _) = register(&state, "query@example.com").await;

    let (status, body) = send(
        &state,
        "GET",
        "/api/campaigns?limit=abc",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "body: {body}");
}

// ============================================================================
// Missing account
// ============================================================================

#[tokio::test]
async fn test_deleted_account_with_live_token_is_not_found() {
    let state = build_app_state(create_test_db().await);
    let (token, user_id) = register(&state, "gone@example.com").await;
    let ledger_before = credit_transaction::Entity::find()
        .count(&state.db)
        .await
        .unwrap();

    user::Entity::delete_by_id(user_id)
        .exec(&state.db)
        .await
        .unwrap();

    let (status, body) = send(
        &state,
        "POST",
        "/api/campaigns",
        Some(&token),
        Some(campaign_body(&["5550000001"])),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
    assert_eq!(campaign_count(&state).await, 0);
    assert!(
        credit_transaction::Entity::find()
            .count(&state.db)
            .await
            .unwrap()
            <= ledger_before
    );
}

// ============================================================================
// Dropped requests and restart recovery
// ============================================================================

async fn wait_for_status(state: &AppState, campaign_id: &str, status: &str) -> campaign::Model {
    for _ in 0..200 {
        let current = load_campaign(state, campaign_id).await;
        if current.status == status {
            return current;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("campaign {campaign_id} never reached {status}");
}

#[tokio::test]
async fn test_dropped_request_still_refunds_rejection() {
    let gateway = FakeGateway::new(FakeBehavior::Reject("ERROR: busy".to_string()));
    gateway.set_delay(Duration::from_millis(500));
    let state = build_app_state_with(create_test_db().await, gateway, idle_progress());
    let (token, user_id) = register(&state, "hangup@example.com").await;

    let dropped = tokio::time::timeout(
        Duration::from_millis(150),
        send(
            &state,
            "POST",
            "/api/campaigns",
            Some(&token),
            Some(campaign_body(&["5550000001", "5550000002"])),
        ),
    )
    .await;
    assert!(dropped.is_err(), "request should still be waiting on the gateway");
    assert_eq!(balance_of(&state, user_id).await, 98);

    let campaign_id = only_campaign_id(&state).await;
    wait_for_status(&state, &campaign_id, "failed").await;
    assert_refunded(&state, user_id, &campaign_id).await;
}

#[tokio::test]
async fn test_dropped_request_still_settles_acceptance() {
    let gateway = FakeGateway::accepting();
    gateway.set_delay(Duration::from_millis(500));
    let state = build_app_state_with(create_test_db().await, gateway, idle_progress());
    let (token, user_id) = register(&state, "impatient@example.com").await;

    let dropped = tokio::time::timeout(
        Duration::from_millis(150),
        send(
            &state,
            "POST",
            "/api/campaigns",
            Some(&token),
            Some(campaign_body(&["5550000001"])),
        ),
    )
    .await;
    assert!(dropped.is_err());

    let campaign_id = only_campaign_id(&state).await;
    let settled = wait_for_status(&state, &campaign_id, "running").await;
    assert!(settled.gateway_response.unwrap().contains("SENT OK"));
    assert_eq!(balance_of(&state, user_id).await, 99);
}

#[tokio::test]
async fn test_recover_pending_refunds_abandoned_campaigns() {
    let gateway = FakeGateway::accepting();
    gateway.set_delay(Duration::from_secs(3600));
    let state = build_app_state_with(create_test_db().await, gateway, idle_progress());
    let (token, user_id) = register(&state, "crashed@example.com").await;

    let dropped = tokio::time::timeout(
        Duration::from_millis(100),
        send(
            &state,
            "POST",
            "/api/campaigns",
            Some(&token),
            Some(campaign_body(&["5550000001", "5550000002", "5550000003"])),
        ),
    )
    .await;
    assert!(dropped.is_err());

    let campaign_id = only_campaign_id(&state).await;
    assert_eq!(load_campaign(&state, &campaign_id).await.status, "pending");
    assert_eq!(balance_of(&state, user_id).await, 97);

    assert_eq!(state.campaigns.recover_pending().await.unwrap(), 1);

    assert_refunded(&state, user_id, &campaign_id).await;
    assert_eq!(
        load_campaign(&state, &campaign_id).await.gateway_response.as_deref(),
        Some(ABANDONED_RESPONSE)
    );

    assert_eq!(state.campaigns.recover_pending().await.unwrap(), 0);
    assert_eq!(balance_of(&state, user_id).await, 100);
}
