//! In-memory backing store.
//!
//! Implements the storage ports without a database server. Useful for
//! testing and local development; fault injection switches let tests
//! exercise the failure paths of the pool, reaper and session store.

mod connection;
mod store;

pub use connection::{MemoryConnection, MemoryConnector};
pub use store::MemoryStore;
