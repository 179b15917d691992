//! Adapters - Implementations of port interfaces.
//!
//! - `pool` - Bounded connection pool and idle-connection reaper
//! - `postgres` - PostgreSQL connector, session table and admin queries
//! - `memory` - In-memory backing store for tests and local runs
//! - `clock` - System and manual clocks
//! - `http` - axum routes and auth middleware

pub mod clock;
pub mod http;
pub mod memory;
pub mod pool;
pub mod postgres;

pub use clock::{ManualClock, SystemClock};
pub use memory::{MemoryConnection, MemoryConnector, MemoryStore};
pub use pool::{ConnectionHandle, ConnectionPool, IdleConnectionReaper, PoolConfig, PoolError};
pub use postgres::PgConnector;
