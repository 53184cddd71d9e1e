//! Shared fixtures for integration tests: in-memory database, fake
//! gateway, app state and small HTTP helpers.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use tower::util::ServiceExt;

use voicedrop::config::campaigns::CampaignsConfig;
use voicedrop::config::rate_limit::RateLimitConfig;
use voicedrop::endpoints::create_router;
use voicedrop::middleware::RateLimiter;
use voicedrop::migrations::Migrator;
use voicedrop::models::user;
use voicedrop::services::accounts::{self, NewAccount};
use voicedrop::services::gateway::{
    BroadcastGateway, BroadcastRequest, GatewayError, GatewayOutcome,
};
use voicedrop::services::security::TokenService;
use voicedrop::state::AppState;

pub const TEST_SECRET: &[u8] = b"integration-test-secret";
pub const TEST_PASSWORD: &str = "password123";

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// How the fake gateway answers
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    Accept,
    Reject(String),
    Timeout,
    Transport,
}

/// In-process stand-in for the broadcast gateway
pub struct FakeGateway {
    behavior: Mutex<FakeBehavior>,
    delay: Mutex<Duration>,
    calls: Mutex<Vec<BroadcastRequest>>,
}

impl FakeGateway {
    pub fn new(behavior: FakeBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn accepting() -> Arc<Self> {
        Self::new(FakeBehavior::Accept)
    }

    pub fn set_behavior(&self, behavior: FakeBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// Hold every answer back by `delay`
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn calls(&self) -> Vec<BroadcastRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl BroadcastGateway for FakeGateway {
    async fn broadcast(
        &self,
        request: &BroadcastRequest,
    ) -> Result<GatewayOutcome, GatewayError> {
        self.calls.lock().push(request.clone());
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let behavior = self.behavior.lock().clone();
        match behavior {
            FakeBehavior::Accept => Ok(GatewayOutcome::Accepted(format!(
                "SENT OK {} numbers",
                request.recipients.len()
            ))),
            FakeBehavior::Reject(body) => Ok(GatewayOutcome::Rejected(body)),
            FakeBehavior::Timeout => Err(GatewayError::Timeout(Duration::from_secs(30))),
            FakeBehavior::Transport => {
                Err(GatewayError::Transport("connection refused".to_string()))
            }
        }
    }
}

/// Progress settings that keep the timer out of the way of a test
pub fn idle_progress() -> CampaignsConfig {
    CampaignsConfig {
        progress_interval: Duration::from_secs(3600),
        progress_min_step: 5,
        progress_max_step: 15,
    }
}

/// Progress settings that finish a campaign within a few ticks
pub fn fast_progress() -> CampaignsConfig {
    CampaignsConfig {
        progress_interval: Duration::from_millis(10),
        progress_min_step: 40,
        progress_max_step: 40,
    }
}

pub fn build_app_state_with(
    db: DatabaseConnection,
    gateway: Arc<FakeGateway>,
    progress: CampaignsConfig,
) -> AppState {
    AppState::new(
        db,
        TokenService::new(TEST_SECRET, 24),
        gateway,
        progress,
        RateLimiter::new(RateLimitConfig::new(10_000, 60), false),
    )
}

/// App state with an accepting gateway and an idle progress timer
pub fn build_app_state(db: DatabaseConnection) -> AppState {
    build_app_state_with(db, FakeGateway::accepting(), idle_progress())
}

/// Send a request through a fresh router and decode the JSON body
pub async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).to_string(),
        ))
    };

    (status, json)
}

/// Register through the API; returns (token, user id)
pub async fn register(state: &AppState, email: &str) -> (String, i64) {
    let (status, body) = send(
        state,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "name": "Test User",
            "email": email,
            "password": TEST_PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_i64().unwrap(),
    )
}

/// Create an account directly and mint a token for it
pub async fn create_test_user(
    state: &AppState,
    email: &str,
    is_admin: bool,
) -> (user::Model, String) {
    let created = accounts::create_account(
        &state.db,
        NewAccount {
            name: "Fixture".to_string(),
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            is_admin,
        },
    )
    .await
    .expect("Failed to create test user");
    let token = state.tokens.issue(&created).unwrap();
    (created, token)
}

pub async fn create_test_admin(state: &AppState, email: &str) -> (user::Model, String) {
    create_test_user(state, email, true).await
}

/// A valid campaign body for the given numbers
pub fn campaign_body(numbers: &[&str]) -> Value {
    serde_json::json!({
        "senderId": "5551234567",
        "receiverNumbers": numbers,
        "audioFile": "https://cdn.example.com/drop.mp3",
        "audioFileType": "mp3",
    })
}

/// Current credit balance for a user
pub async fn balance_of(state: &AppState, user_id: i64) -> i64 {
    accounts::get_user(&state.db, user_id).await.unwrap().credits
}
