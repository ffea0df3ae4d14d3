//! Database connection pool and schema management.
//!
//! This module turns [`ConnectionSettings`] into a live PostgreSQL pool and
//! makes sure every managed entity has its table:
//! - Creating the connection pool from the settings
//! - Running embedded migrations when schema sync is enabled
//! - Verifying the entity tables exist

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, Pool, Postgres};

use crate::config::{ConnectionSettings, Environment};
use crate::error::SchemaError;

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Build connect options from the settings.
///
/// Statement logging stays on sqlx's default level unless the settings turn
/// logging off.
pub fn connect_options(settings: &ConnectionSettings) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.username)
        .password(settings.password())
        .database(&settings.database);

    if settings.logging {
        options
    } else {
        options.disable_statement_logging()
    }
}

/// Create a new PostgreSQL connection pool.
///
/// - Maximum connections: 5
/// - Connections are created lazily as needed
///
/// # Errors
///
/// Returns an error if:
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(settings: &ConnectionSettings) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options(settings))
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each one runs
/// only once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // Embedded at compile time; same files as `settings.migrations` matches
    sqlx::migrate!("./migrations").run(pool).await
}

/// Bring the schema in line with the managed entities.
///
/// Runs migrations when `synchronize` is set, then checks that each entity's
/// table exists.
///
/// # Errors
///
/// Returns [`SchemaError::MissingTable`] for the first entity without a table.
pub async fn prepare_schema(
    pool: &DbPool,
    settings: &ConnectionSettings,
) -> Result<(), SchemaError> {
    if settings.synchronize {
        if settings.environment == Environment::Production {
            tracing::warn!("Schema sync is enabled against a production database");
        }
        run_migrations(pool).await?;
        tracing::info!(migrations = settings.migrations, "Database migrations complete");
    } else {
        tracing::info!("Schema sync disabled, skipping migrations");
    }

    for entity in &settings.entities {
        let table: Option<String> = sqlx::query_scalar("SELECT to_regclass($1)::text")
            .bind(entity.table)
            .fetch_one(pool)
            .await?;

        if table.is_none() {
            return Err(SchemaError::MissingTable {
                entity: entity.name,
                table: entity.table,
            });
        }
        tracing::debug!(entity = entity.name, table = entity.table, "Entity table present");
    }

    Ok(())
}

/// Check database connectivity with a trivial query.
pub async fn ping(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn connect_options_follow_settings() {
        let vars: HashMap<String, String> = [
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_USERNAME", "quotes"),
            ("DB_NAME", "quotes_test"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let settings = ConnectionSettings::from_vars(Environment::Development, &vars).unwrap();

        let options = connect_options(&settings);

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "quotes");
        assert_eq!(options.get_database(), Some("quotes_test"));
    }

    #[tokio::test]
    async fn ping_fails_against_unreachable_database() {
        let vars = HashMap::from([("DB_PORT".to_string(), "1".to_string())]);
        let settings = ConnectionSettings::from_vars(Environment::Development, &vars).unwrap();
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(500))
            .connect_lazy_with(connect_options(&settings));

        assert!(ping(&pool).await.is_err());
    }
}
