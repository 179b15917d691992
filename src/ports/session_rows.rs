//! SessionRows port - session table access on a single connection.

use async_trait::async_trait;

use crate::domain::foundation::{StorageError, Timestamp, UserId};
use crate::domain::session::{Session, SessionToken};

/// Session table operations, implemented by a connection type.
///
/// The session store checks out one connection per operation and calls these
/// methods on it, so implementations take `&mut self` and never acquire
/// further connections.
///
/// # Contract
///
/// - `insert_session` returns `StorageError::IntegrityViolation` when the
///   token already exists
/// - deletes of absent rows succeed and report zero rows removed
#[async_trait]
pub trait SessionRows: Send {
    /// Persists a new session.
    async fn insert_session(&mut self, session: &Session) -> Result<(), StorageError>;

    /// Looks a session up by token.
    async fn find_session(
        &mut self,
        token: &SessionToken,
    ) -> Result<Option<Session>, StorageError>;

    /// Deletes one session; returns true if a row was removed.
    async fn delete_session(&mut self, token: &SessionToken) -> Result<bool, StorageError>;

    /// Deletes every session of a user; returns the number removed.
    async fn delete_user_sessions(&mut self, user_id: UserId) -> Result<u64, StorageError>;

    /// Deletes every session with `expires_at < now`; returns the number removed.
    async fn delete_expired_sessions(&mut self, now: Timestamp) -> Result<u64, StorageError>;
}
