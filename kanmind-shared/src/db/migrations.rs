/// Database migration runner
///
/// Migrations live in the workspace-level `migrations/` directory and are
/// embedded into the binary with `sqlx::migrate!`. Each migration is a
/// reversible pair:
/// - `{timestamp}_{name}.up.sql`
/// - `{timestamp}_{name}.down.sql`
///
/// Foreign keys declared there carry the cascade rules the rest of the crate
/// relies on (board → tasks → comments).

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Runs all pending migrations
///
/// # Errors
///
/// Returns an error if a migration fails to apply; sqlx rolls back the
/// failing migration's transaction.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match sqlx::migrate!("../migrations").run(pool).await {
        Ok(()) => {
            info!("Database schema is up to date");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Creates the database if it doesn't exist (development and tests)
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
        return Ok(());
    }

    info!("Database does not exist, creating it");
    Postgres::create_database(database_url).await?;
    Ok(())
}
