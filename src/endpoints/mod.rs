pub mod admin;
pub mod auth;
pub mod campaigns;

use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::middleware::{rate_limit, require_auth, security_headers};
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/auth", auth::auth_routes(state.clone()));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/api/auth/me",
            get(auth::me).with_state(state.clone()),
        )
        .nest("/api/campaigns", campaigns::campaign_routes(state.clone()))
        .nest("/api/admin", admin::admin_routes(state.clone()))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    public_routes
        .merge(protected_routes)
        .fallback(not_found)
        .layer(axum_middleware::from_fn_with_state(state, rate_limit))
        .layer(axum_middleware::from_fn(security_headers))
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint not found" })),
    )
}
