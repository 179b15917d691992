//! Embedded schema migrations.

use sqlx::migrate::{MigrateError, Migrator};
use thiserror::Error;
use tracing::info;

use super::PgConnector;
use crate::adapters::pool::{ConnectionPool, PoolError};

/// Migrations under `migrations/`, compiled into the binary.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Could not acquire a connection for migrations: {0}")]
    Pool(#[from] PoolError),

    #[error("Migration failed: {0}")]
    Migrate(#[from] MigrateError),
}

/// Applies pending migrations on one pooled connection.
pub async fn run_migrations(pool: &ConnectionPool<PgConnector>) -> Result<(), MigrationError> {
    let mut conn = pool.acquire().await?;
    MIGRATOR.run(&mut *conn).await?;
    info!(migrations = MIGRATOR.iter().count(), "Database migrations applied");
    Ok(())
}
