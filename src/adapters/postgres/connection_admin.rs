//! PostgreSQL implementation of ConnectionAdmin.
//!
//! Reads `pg_stat_activity` for backends owned by `current_user` that have
//! sat in the `idle` state past the threshold, and terminates them with
//! `pg_terminate_backend`. The querying backend itself is always excluded.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgConnection;

use super::map_sqlx_error;
use crate::domain::foundation::StorageError;
use crate::ports::{BackendConnection, ConnectionAdmin};

const IDLE_CONNECTIONS_SQL: &str = r#"
    SELECT pid::BIGINT AS pid,
           usename::TEXT AS usename,
           EXTRACT(EPOCH FROM (now() - state_change))::BIGINT AS idle_secs
    FROM pg_stat_activity
    WHERE usename = current_user
      AND state = 'idle'
      AND pid <> pg_backend_pid()
      AND state_change < now() - make_interval(secs => $1)
    ORDER BY state_change
"#;

#[async_trait]
impl ConnectionAdmin for PgConnection {
    async fn idle_connections(
        &mut self,
        idle_longer_than: Duration,
    ) -> Result<Vec<BackendConnection>, StorageError> {
        let rows: Vec<(i64, String, i64)> = sqlx::query_as(IDLE_CONNECTIONS_SQL)
            .bind(idle_longer_than.as_secs_f64())
            .fetch_all(&mut *self)
            .await
            .map_err(|e| map_sqlx_error("Failed to list idle connections", e))?;

        Ok(rows
            .into_iter()
            .map(|(id, user, idle_secs)| BackendConnection {
                id,
                user,
                idle_for: Duration::from_secs(idle_secs.max(0) as u64),
            })
            .collect())
    }

    async fn terminate_connection(&mut self, id: i64) -> Result<bool, StorageError> {
        let terminated: bool = sqlx::query_scalar("SELECT pg_terminate_backend($1::INT)")
            .bind(id)
            .fetch_one(&mut *self)
            .await
            .map_err(|e| map_sqlx_error("Failed to terminate connection", e))?;

        Ok(terminated)
    }
}
