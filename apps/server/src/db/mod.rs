//! Database layer - SQLite pool, migrations and statement execution

pub mod execute;

pub use execute::{ExecutionError, QueryExecutor};

use crate::config::DatabaseConfig;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Open the connection pool described by `config`.
///
/// In-memory databases live and die with their connection, so they get a
/// single connection that is never recycled.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?;

    let pool = if config.url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?
    };

    tracing::info!(
        max_connections = pool.options().get_max_connections(),
        "Database pool ready"
    );

    Ok(pool)
}

/// Apply the embedded migrations under `migrations/`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Refresh the pool gauges exposed on `/metrics`.
pub fn record_pool_metrics(pool: &SqlitePool) {
    let size = i64::from(pool.size());
    let idle = i64::try_from(pool.num_idle()).unwrap_or(i64::MAX);
    crate::metrics::DB_CONNECTIONS_ACTIVE.set(size);
    crate::metrics::DB_CONNECTIONS_IDLE.set(idle);
}
