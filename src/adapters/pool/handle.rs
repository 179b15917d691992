//! ConnectionHandle - exclusive checkout of one pooled connection.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tokio::sync::OwnedSemaphorePermit;
use tracing::debug;

use super::pool::SharedPool;
use crate::ports::Connector;

/// A connection checked out of a [`super::ConnectionPool`].
///
/// Dereferences to the underlying connection. Dropping the handle returns the
/// connection to the pool exactly once, whether the caller finished normally,
/// returned early with an error, or unwound from a panic.
pub struct ConnectionHandle<C: Connector> {
    connection: Option<C::Connection>, // only None during drop
    pool: Arc<SharedPool<C>>,
    // Dropped after `Drop::drop` has parked the connection, so a waiter that
    // wakes on this permit finds the connection idle.
    _permit: OwnedSemaphorePermit,
}

impl<C: Connector> ConnectionHandle<C> {
    pub(super) fn new(
        connection: C::Connection,
        pool: Arc<SharedPool<C>>,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        Self {
            connection: Some(connection),
            pool,
            _permit: permit,
        }
    }

    /// Returns the connection to the pool. Same as dropping the handle.
    pub fn release(self) {
        drop(self);
    }

    /// Closes the connection instead of returning it.
    ///
    /// Use when the connection is known to be broken.
    pub fn discard(mut self) {
        if let Some(connection) = self.connection.take() {
            debug!(pool = %self.pool.name(), "Discarding pooled connection");
            self.pool.retire(connection);
        }
    }

    /// Name of the pool this handle came from.
    pub fn pool_name(&self) -> &str {
        self.pool.name()
    }
}

impl<C: Connector> Deref for ConnectionHandle<C> {
    type Target = C::Connection;

    fn deref(&self) -> &Self::Target {
        self.connection.as_ref().expect("connection present until drop")
    }
}

impl<C: Connector> DerefMut for ConnectionHandle<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection.as_mut().expect("connection present until drop")
    }
}

impl<C: Connector> Drop for ConnectionHandle<C> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.pool.release(connection);
        }
    }
}

impl<C: Connector> fmt::Debug for ConnectionHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("pool", &self.pool.name())
            .finish_non_exhaustive()
    }
}
