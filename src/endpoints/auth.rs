use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::error::Result;
use crate::middleware::Authenticated;
use crate::schemas::{AuthResponse, LoginRequest, MeResponse, RegisterRequest};
use crate::services::accounts::{self, NewAccount};
use crate::state::AppState;

/// Public auth routes (register and login)
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state)
}

/// Create an account with the starting credit grant and sign the caller in
async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let Json(request) = payload?;
    let request = request.normalized()?;

    let created = accounts::create_account(
        &state.db,
        NewAccount {
            name: request.name,
            email: request.email,
            password: request.password,
            is_admin: false,
        },
    )
    .await?;

    let token = state.tokens.issue(&created)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: created.into(),
            token,
        }),
    ))
}

/// Verify credentials and issue a bearer token
async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(request) = payload?;
    let request = request.normalized()?;

    let found = accounts::authenticate(&state.db, &request.email, &request.password).await?;
    let token = state.tokens.issue(&found)?;

    tracing::info!(user_id = found.id, "User logged in");

    Ok(Json(AuthResponse {
        user: found.into(),
        token,
    }))
}

/// Current account with live balance
pub async fn me(
    State(state): State<AppState>,
    caller: Authenticated,
) -> Result<Json<MeResponse>> {
    let found = accounts::get_user(&state.db, caller.user_id()).await?;
    Ok(Json(MeResponse { user: found.into() }))
}
