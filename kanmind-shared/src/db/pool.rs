/// Database connection pool management
///
/// Wraps `PgPoolOptions` with the settings the KanMind services run with and
/// verifies connectivity before handing the pool out.
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::new(std::env::var("DATABASE_URL")?);
///     let pool = create_pool(config).await?;
///
///     let (one,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await?;
///     assert_eq!(one, 1);
///     Ok(())
/// }
/// ```

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the database connection pool
///
/// Timeouts are in seconds so they can be read straight from environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of idle connections kept warm
    pub min_connections: u32,

    /// How long to wait for a free connection before failing the request
    pub acquire_timeout_seconds: u64,

    /// Idle connections older than this are closed (None = never)
    pub idle_timeout_seconds: Option<u64>,

    /// Connections are recycled after this lifetime (None = never)
    pub max_lifetime_seconds: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
        }
    }
}

impl DatabaseConfig {
    /// Default settings for the given connection URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Overrides the pool size
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self.min_connections = self.min_connections.min(max_connections);
        self
    }
}

/// Creates a PostgreSQL connection pool and runs a health check against it
///
/// # Errors
///
/// Returns an error if the URL is invalid, the server is unreachable, or the
/// health check query fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_seconds = config.acquire_timeout_seconds,
        "Creating database connection pool"
    );

    let mut options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds));

    if let Some(idle_timeout) = config.idle_timeout_seconds {
        options = options.idle_timeout(Duration::from_secs(idle_timeout));
    }

    if let Some(max_lifetime) = config.max_lifetime_seconds {
        options = options.max_lifetime(Duration::from_secs(max_lifetime));
    }

    let pool = options.connect(&config.url).await?;
    health_check(&pool).await?;

    info!("Database connection pool ready");
    Ok(pool)
}

/// Executes `SELECT 1` to verify the database is reachable
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let (value,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if value != 1 {
        warn!(value, "Database health check returned unexpected value");
        return Err(sqlx::Error::Protocol(
            "Health check returned unexpected value".into(),
        ));
    }

    debug!("Database health check passed");
    Ok(())
}

/// Gracefully closes the pool during shutdown
pub async fn close_pool(pool: PgPool) {
    info!("Closing database connection pool");
    pool.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout_seconds, 30);
        assert_eq!(config.idle_timeout_seconds, Some(600));
        assert_eq!(config.max_lifetime_seconds, Some(1800));
    }

    #[test]
    fn test_with_max_connections_clamps_minimum() {
        let config = DatabaseConfig::new("postgresql://localhost/kanmind").with_max_connections(0);
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.min_connections, 0);
        assert_eq!(config.url, "postgresql://localhost/kanmind");
    }
}
