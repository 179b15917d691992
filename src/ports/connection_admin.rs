//! ConnectionAdmin port - the storage server's view of open connections.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::StorageError;

/// One connection as seen by the storage server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConnection {
    /// Server-side connection id (a backend pid on PostgreSQL).
    pub id: i64,
    /// Credential that owns the connection.
    pub user: String,
    /// Time since the connection last did anything.
    pub idle_for: Duration,
}

/// Administrative access used by the idle-connection reaper.
///
/// Implementations only report connections owned by the credential the
/// current connection is authenticated as, and never the current
/// connection itself.
#[async_trait]
pub trait ConnectionAdmin: Send {
    /// Lists connections idle for longer than `idle_longer_than`.
    async fn idle_connections(
        &mut self,
        idle_longer_than: Duration,
    ) -> Result<Vec<BackendConnection>, StorageError>;

    /// Asks the server to terminate a connection.
    ///
    /// Returns false when the connection no longer exists.
    async fn terminate_connection(&mut self, id: i64) -> Result<bool, StorageError>;
}
