//! Quotes service - database bootstrap entry point
//!
//! # Startup Flow
//!
//! 1. Initialize logging
//! 2. Load configuration for the active environment
//! 3. Create database connection pool
//! 4. Prepare the schema (migrations when schema sync is on, entity table check)
//! 5. Serve the health endpoint on the configured port

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use quotes_db_config::{config::Config, db, handlers, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        environment = %config.environment(),
        env_file = config.database.env_file(),
        "Configuration loaded"
    );
    tracing::debug!(settings = ?config.database, "Connection settings");

    let pool = db::create_pool(&config.database).await?;
    tracing::info!(
        host = %config.database.host,
        port = config.database.port,
        database = %config.database.database,
        "Database pool created"
    );

    db::prepare_schema(&pool, &config.database).await?;
    tracing::info!(
        entities = config.database.entities.len(),
        "Database schema ready"
    );

    let addr = format!("0.0.0.0:{}", config.server_port);
    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
