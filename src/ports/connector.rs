//! Connector port - opens raw backing-store connections for the pool.

use async_trait::async_trait;

use crate::domain::foundation::StorageError;

/// Factory for backing-store connections.
///
/// The pool owns the connector and calls it whenever it needs a new
/// connection; it never shares a connection between two checkouts.
///
/// # Contract
///
/// - `connect` either returns a ready connection or a `StorageError`
/// - `disconnect` is best-effort and must not panic
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Connection type handed out by the pool.
    type Connection: Send + 'static;

    /// Opens a new connection.
    async fn connect(&self) -> Result<Self::Connection, StorageError>;

    /// Closes a connection the pool no longer wants.
    async fn disconnect(&self, connection: Self::Connection);

    /// Human readable target for log lines. Must not include credentials.
    fn describe(&self) -> String;
}
