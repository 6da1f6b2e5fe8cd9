//! # KanMind API Server
//!
//! Loads configuration from the environment, connects to PostgreSQL, applies
//! pending migrations and serves the HTTP API until Ctrl+C.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/kanmind JWT_SECRET=... cargo run -p kanmind-api
//! ```

use kanmind_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use kanmind_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kanmind_api=debug,kanmind_shared=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log.format);

    tracing::info!(
        "KanMind API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(
        DatabaseConfig::new(config.database.url.clone())
            .with_max_connections(config.database.max_connections),
    )
    .await?;

    run_migrations(&pool).await?;

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}
