use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

use crate::config::CONFIG;
use crate::error::{AppError, Result};
use crate::migrations::Migrator;

pub type DbConn = DatabaseConnection;

/// Create a new database connection and run migrations using config
pub async fn connect() -> Result<DbConn> {
    connect_with(
        &CONFIG.database.database_url,
        CONFIG.database.max_connections,
    )
    .await
}

/// Create a new database connection with a specific URL and run migrations
pub async fn connect_with_url(database_url: &str) -> Result<DbConn> {
    connect_with(database_url, 10).await
}

async fn connect_with(database_url: &str, max_connections: u32) -> Result<DbConn> {
    // Each in-memory SQLite connection would otherwise see its own database
    let max_connections = if database_url.contains(":memory:") {
        1
    } else {
        max_connections
    };
    tracing::info!(
        backend = backend_name(database_url),
        max_connections,
        "Connecting to database..."
    );

    let mut opts = ConnectOptions::new(database_url);
    opts.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    let db = Database::connect(opts)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))?;

    tracing::info!("Running database migrations...");
    Migrator::up(&db, None)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to run migrations: {}", e)))?;
    tracing::info!("Database migrations completed");

    Ok(db)
}

/// Scheme of the connection URL, safe to log (no credentials)
fn backend_name(database_url: &str) -> &str {
    database_url.split(':').next().unwrap_or("unknown")
}
