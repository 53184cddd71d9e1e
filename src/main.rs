use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voicedrop::config::{Config, LogFormat, CONFIG};
use voicedrop::endpoints::create_router;
use voicedrop::services::bootstrap::ensure_admin;
use voicedrop::services::HttpGateway;
use voicedrop::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(&CONFIG);

    tracing::info!("Starting voicedrop backend v{}", CONFIG.version);

    // Connect and migrate
    let db = voicedrop::db::connect().await?;
    tracing::info!("Database connection established");

    ensure_admin(&db, &CONFIG.auth).await?;

    let gateway = HttpGateway::new(CONFIG.gateway.clone())?;
    tracing::info!(url = %CONFIG.gateway.url, timeout = ?CONFIG.gateway.timeout, "Gateway client ready");

    let state = AppState::from_config(db, &CONFIG, Arc::new(gateway));

    // Settle what a previous process left behind before accepting requests
    state.campaigns.recover_pending().await?;
    state.progress.resume_running().await?;

    let app = create_app(state, &CONFIG);

    let listener =
        tokio::net::TcpListener::bind((CONFIG.server.host.as_str(), CONFIG.server.port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("voicedrop={level},tower_http={level}", level = config.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Create the main application router
fn create_app(state: AppState, config: &Config) -> Router {
    Router::new()
        .merge(create_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        tracing::warn!("VOICEDROP_ALLOWED_ORIGINS not set, allowing any origin");
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
