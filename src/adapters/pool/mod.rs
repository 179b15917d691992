//! Bounded connection pool and its idle-connection reaper.
//!
//! - `ConnectionPool` - Process-wide gateway to a bounded set of connections
//! - `ConnectionHandle` - Exclusive checkout, returned to the pool on drop
//! - `IdleConnectionReaper` - Background task killing storage-side idle connections
//!
//! ## Acquire policy
//!
//! `acquire` blocks until a connection is free, for at most
//! `PoolConfig::acquire_timeout` (30 seconds by default), then fails with
//! `PoolError::Exhausted`. It never blocks without a bound.

mod config;
mod error;
mod handle;
mod pool;
mod reaper;

pub use config::PoolConfig;
pub use error::PoolError;
pub use handle::ConnectionHandle;
pub use pool::{ConnectionPool, PoolStatus};
pub use reaper::{
    IdleConnectionReaper, ReapReport, DEFAULT_IDLE_THRESHOLD, DEFAULT_REAP_INTERVAL,
    DEFAULT_STOP_TIMEOUT,
};

use once_cell::sync::Lazy;

use crate::adapters::postgres::PgConnector;

static GLOBAL_POOL: Lazy<ConnectionPool<PgConnector>> = Lazy::new(ConnectionPool::new);

/// The process-wide PostgreSQL pool.
///
/// Starts uninitialized; the binary calls `initialize` once at startup and
/// `shutdown` on exit. Clones share the same underlying pool.
pub fn global() -> &'static ConnectionPool<PgConnector> {
    &GLOBAL_POOL
}
