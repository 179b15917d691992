//! Application layer - services built on the pool and the session ports.
//!
//! - `SessionStore` - Issues, validates and revokes login sessions
//! - `SessionCleanupScheduler` - Periodic sweep of expired sessions

mod session_cleanup;
mod session_store;

pub use session_cleanup::{SessionCleanupScheduler, DEFAULT_CLEANUP_INTERVAL};
pub use session_store::{
    SessionStore, SessionStoreError, DEFAULT_SESSION_TTL_HOURS, MAX_TOKEN_ATTEMPTS,
};
