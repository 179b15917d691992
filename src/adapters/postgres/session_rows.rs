//! PostgreSQL implementation of SessionRows.
//!
//! Persists sessions to the `login_sessions` table. "Now" is always bound as
//! a parameter, never taken from the server clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgConnection;

use super::map_sqlx_error;
use crate::domain::foundation::{StorageError, Timestamp, UserId};
use crate::domain::session::{Session, SessionToken};
use crate::ports::SessionRows;

#[async_trait]
impl SessionRows for PgConnection {
    async fn insert_session(&mut self, session: &Session) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO login_sessions (session_id, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(session.token().as_str())
        .bind(session.user_id().as_i64())
        .bind(*session.expires_at().as_datetime())
        .execute(&mut *self)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert session", e))?;

        Ok(())
    }

    async fn find_session(
        &mut self,
        token: &SessionToken,
    ) -> Result<Option<Session>, StorageError> {
        let row: Option<(i64, DateTime<Utc>)> = sqlx::query_as(
            "SELECT user_id, expires_at FROM login_sessions WHERE session_id = $1",
        )
        .bind(token.as_str())
        .fetch_optional(&mut *self)
        .await
        .map_err(|e| map_sqlx_error("Failed to fetch session", e))?;

        Ok(row.map(|(user_id, expires_at)| {
            Session::new(
                token.clone(),
                UserId::new(user_id),
                Timestamp::from_datetime(expires_at),
            )
        }))
    }

    async fn delete_session(&mut self, token: &SessionToken) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM login_sessions WHERE session_id = $1")
            .bind(token.as_str())
            .execute(&mut *self)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete session", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user_sessions(&mut self, user_id: UserId) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM login_sessions WHERE user_id = $1")
            .bind(user_id.as_i64())
            .execute(&mut *self)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete user sessions", e))?;

        Ok(result.rows_affected())
    }

    async fn delete_expired_sessions(&mut self, now: Timestamp) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM login_sessions WHERE expires_at < $1")
            .bind(*now.as_datetime())
            .execute(&mut *self)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete expired sessions", e))?;

        Ok(result.rows_affected())
    }
}
