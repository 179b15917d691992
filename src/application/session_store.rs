//! SessionStore - issues, validates and revokes login sessions.
//!
//! Every operation checks out exactly one pooled connection and returns it
//! on every exit path. Expiry is decided against the injected [`Clock`], so
//! the same rules apply regardless of the backing store's own clock.
//!
//! ## Two surfaces
//!
//! The `try_*` methods return `Result<_, SessionStoreError>` so callers can
//! tell pool exhaustion apart and retry. The plain methods log the failure
//! and collapse it into `None`, `false` or `0`; nothing they return reveals
//! whether a token never existed, expired, or could not be checked.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::adapters::pool::{ConnectionHandle, ConnectionPool, PoolError};
use crate::domain::foundation::{StorageError, Timestamp, UserId};
use crate::domain::session::{Session, SessionToken};
use crate::ports::{Clock, Connector, SessionRevoker, SessionRows, SessionValidator};

/// Lifetime of a session created without an explicit TTL.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Token generations attempted before giving up on a colliding insert.
pub const MAX_TOKEN_ATTEMPTS: u32 = 3;

/// Errors surfaced by the fallible session operations.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("session ttl must be positive and keep the expiry in range")]
    InvalidTtl,

    #[error("no unique session token after {attempts} attempts")]
    TokenCollision { attempts: u32 },
}

impl SessionStoreError {
    /// True for failures a caller may retry as-is.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Pool(e) => e.is_retryable(),
            Self::Storage(StorageError::Transient(_)) => true,
            Self::TokenCollision { .. } => true,
            Self::Storage(StorageError::IntegrityViolation(_)) | Self::InvalidTtl => false,
        }
    }
}

/// Token-based session store backed by the connection pool.
pub struct SessionStore<C: Connector> {
    pool: ConnectionPool<C>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl<C: Connector> Clone for SessionStore<C> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            clock: Arc::clone(&self.clock),
            default_ttl: self.default_ttl,
        }
    }
}

impl<C> SessionStore<C>
where
    C: Connector,
    C::Connection: SessionRows,
{
    pub fn new(pool: ConnectionPool<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            clock,
            default_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }

    /// Create store with a custom default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // ════════════════════════════════════════════════════════════════════════
    // Contract operations
    // ════════════════════════════════════════════════════════════════════════

    /// Issues a session with the default TTL; `None` if it could not be stored.
    pub async fn create_session(&self, user_id: UserId) -> Option<SessionToken> {
        self.create_session_with_ttl(user_id, self.default_ttl).await
    }

    /// Issues a session expiring `ttl` from now; `None` if it could not be stored.
    pub async fn create_session_with_ttl(
        &self,
        user_id: UserId,
        ttl: Duration,
    ) -> Option<SessionToken> {
        match self.try_create_session_with_ttl(user_id, ttl).await {
            Ok(token) => Some(token),
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to create session");
                None
            }
        }
    }

    /// Resolves a token to its user, or `None` if it does not authenticate.
    pub async fn validate_session(&self, token: &str) -> Option<UserId> {
        match self.try_validate_session(token).await {
            Ok(user_id) => user_id,
            Err(e) => {
                error!(error = %e, "Failed to validate session");
                None
            }
        }
    }

    /// Deletes one session; true if a row was removed.
    pub async fn delete_session(&self, token: &str) -> bool {
        match self.try_delete_session(token).await {
            Ok(removed) => removed,
            Err(e) => {
                error!(error = %e, "Failed to delete session");
                false
            }
        }
    }

    /// Deletes every session of `user_id`; true if the delete ran.
    pub async fn delete_user_sessions(&self, user_id: UserId) -> bool {
        match self.try_delete_user_sessions(user_id).await {
            Ok(_) => true,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to delete user sessions");
                false
            }
        }
    }

    /// Deletes every expired session; returns how many were removed.
    pub async fn cleanup_expired_sessions(&self) -> u64 {
        match self.try_cleanup_expired_sessions().await {
            Ok(removed) => removed,
            Err(e) => {
                error!(error = %e, "Failed to clean up expired sessions");
                0
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Fallible operations
    // ════════════════════════════════════════════════════════════════════════

    pub async fn try_create_session(
        &self,
        user_id: UserId,
    ) -> Result<SessionToken, SessionStoreError> {
        self.try_create_session_with_ttl(user_id, self.default_ttl)
            .await
    }

    /// Issues a session expiring `ttl` from now.
    ///
    /// A token collision regenerates the token, up to [`MAX_TOKEN_ATTEMPTS`]
    /// inserts in total.
    pub async fn try_create_session_with_ttl(
        &self,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<SessionToken, SessionStoreError> {
        if ttl <= Duration::zero() {
            return Err(SessionStoreError::InvalidTtl);
        }
        let Some(session) = Session::issue(user_id, self.clock.now(), ttl) else {
            return Err(SessionStoreError::InvalidTtl);
        };

        let mut conn = self.pool.acquire().await?;
        let result = insert_with_fresh_tokens(&mut *conn, session).await;
        let session = settle(conn, result)?;

        debug!(
            user_id = %user_id,
            expires_at = %session.expires_at().as_datetime(),
            "Session created"
        );
        Ok(session.token().clone())
    }

    /// Resolves a token to its user.
    ///
    /// An expired row is deleted on the same connection before reporting
    /// `None`, so repeated lookups of an expired token behave identically.
    /// Malformed tokens return `Ok(None)` without touching the pool.
    pub async fn try_validate_session(
        &self,
        token: &str,
    ) -> Result<Option<UserId>, SessionStoreError> {
        let Some(token) = SessionToken::parse(token) else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        let result = lookup(&mut *conn, &token, self.clock.now()).await;
        settle(conn, result)
    }

    /// Deletes one session; true if a row was removed.
    pub async fn try_delete_session(&self, token: &str) -> Result<bool, SessionStoreError> {
        let Some(token) = SessionToken::parse(token) else {
            return Ok(false);
        };

        let mut conn = self.pool.acquire().await?;
        let result = conn.delete_session(&token).await;
        let removed = settle(conn, result)?;
        debug!(removed, "Session delete");
        Ok(removed)
    }

    /// Deletes every session of `user_id`; returns the number removed.
    pub async fn try_delete_user_sessions(
        &self,
        user_id: UserId,
    ) -> Result<u64, SessionStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = conn.delete_user_sessions(user_id).await;
        let removed = settle(conn, result)?;
        info!(user_id = %user_id, removed, "User sessions revoked");
        Ok(removed)
    }

    /// Deletes every session with `expires_at < now`; returns the number removed.
    pub async fn try_cleanup_expired_sessions(&self) -> Result<u64, SessionStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = conn.delete_expired_sessions(self.clock.now()).await;
        let removed = settle(conn, result)?;
        if removed > 0 {
            info!(removed, "Expired sessions cleaned up");
        } else {
            debug!("No expired sessions to clean up");
        }
        Ok(removed)
    }
}

async fn insert_with_fresh_tokens<R: SessionRows + ?Sized>(
    rows: &mut R,
    mut session: Session,
) -> Result<Session, SessionStoreError> {
    for attempt in 1..=MAX_TOKEN_ATTEMPTS {
        match rows.insert_session(&session).await {
            Ok(()) => return Ok(session),
            Err(e) if e.is_integrity_violation() => {
                warn!(attempt, "Session token collision, regenerating");
                session = session.with_token(SessionToken::generate());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(SessionStoreError::TokenCollision {
        attempts: MAX_TOKEN_ATTEMPTS,
    })
}

async fn lookup<R: SessionRows + ?Sized>(
    rows: &mut R,
    token: &SessionToken,
    now: Timestamp,
) -> Result<Option<UserId>, StorageError> {
    let Some(session) = rows.find_session(token).await? else {
        return Ok(None);
    };

    if session.is_active_at(now) {
        return Ok(Some(session.user_id()));
    }

    // A concurrent lookup may already have removed it
    rows.delete_session(token).await?;
    debug!(user_id = %session.user_id(), "Expired session removed on lookup");
    Ok(None)
}

/// Returns the connection to the pool, or drops it after a transient storage
/// failure since its state is unknown.
fn settle<C, T, E>(conn: ConnectionHandle<C>, result: Result<T, E>) -> Result<T, SessionStoreError>
where
    C: Connector,
    E: Into<SessionStoreError>,
{
    let result: Result<T, SessionStoreError> = result.map_err(Into::into);
    match &result {
        Err(SessionStoreError::Storage(StorageError::Transient(_))) => conn.discard(),
        _ => conn.release(),
    }
    result
}

#[async_trait]
impl<C> SessionValidator for SessionStore<C>
where
    C: Connector,
    C::Connection: SessionRows,
{
    async fn validate(&self, token: &str) -> Option<UserId> {
        self.validate_session(token).await
    }
}

#[async_trait]
impl<C> SessionRevoker for SessionStore<C>
where
    C: Connector,
    C::Connection: SessionRows,
{
    async fn revoke(&self, token: &str) -> bool {
        self.delete_session(token).await
    }

    async fn revoke_all(&self, user_id: UserId) -> bool {
        self.delete_user_sessions(user_id).await
    }
}
