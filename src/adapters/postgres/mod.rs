//! PostgreSQL adapters - Database implementations for the storage ports.
//!
//! This module provides:
//! - `PgConnector` - Opens `sqlx::PgConnection`s for the pool
//! - `SessionRows` for `PgConnection` - The `login_sessions` table
//! - `ConnectionAdmin` for `PgConnection` - `pg_stat_activity` and
//!   `pg_terminate_backend`
//! - `run_migrations` - Embedded schema migrations

mod connection_admin;
mod connector;
mod migrations;
mod session_rows;

pub use connector::PgConnector;
pub use migrations::{run_migrations, MigrationError, MIGRATOR};

use crate::domain::foundation::StorageError;

/// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Maps a driver error onto the storage taxonomy.
pub(crate) fn map_sqlx_error(context: &str, e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StorageError::integrity(format!("{}: {}", context, db.message()))
        }
        _ => StorageError::transient(format!("{}: {}", context, e)),
    }
}
