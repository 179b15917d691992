//! Shared state behind every in-memory connection.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::MemoryConnector;
use crate::domain::foundation::StorageError;
use crate::domain::session::{Session, SessionToken};
use crate::ports::BackendConnection;

#[derive(Default)]
pub(super) struct MemoryState {
    pub(super) sessions: HashMap<SessionToken, Session>,
    pub(super) backends: Vec<BackendConnection>,
    pub(super) unreachable: bool,
    pub(super) failing_queries: bool,
    pub(super) failing_terminations: HashSet<i64>,
    pub(super) forced_conflicts: usize,
    pub(super) connects: usize,
    pub(super) open_connections: usize,
    pub(super) next_connection_id: i64,
}

/// In-memory database shared by all connections created from it.
#[derive(Clone)]
pub struct MemoryStore {
    pub(super) state: Arc<Mutex<MemoryState>>,
    pub(super) user: String,
}

impl MemoryStore {
    /// Credential the store's own connections authenticate as.
    pub const DEFAULT_USER: &'static str = "tutor_hub";

    /// Create a new empty store
    pub fn new() -> Self {
        Self::with_user(Self::DEFAULT_USER)
    }

    /// Create a store whose connections authenticate as `user`.
    pub fn with_user(user: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            user: user.into(),
        }
    }

    /// Connector producing connections to this store.
    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector::new(self.clone())
    }

    /// Number of stored sessions.
    pub fn session_count(&self) -> usize {
        self.state.lock().sessions.len()
    }

    /// Whether a session row exists for `token`.
    pub fn has_session(&self, token: &SessionToken) -> bool {
        self.state.lock().sessions.contains_key(token)
    }

    /// Writes a session row directly, bypassing the session store.
    pub fn put_session(&self, session: Session) {
        self.state
            .lock()
            .sessions
            .insert(session.token().clone(), session);
    }

    /// Registers a server-side connection in the administrative view.
    pub fn add_backend(&self, id: i64, user: &str, idle_for: Duration) {
        self.state.lock().backends.push(BackendConnection {
            id,
            user: user.to_string(),
            idle_for,
        });
    }

    /// Ids of server-side connections still alive, in insertion order.
    pub fn backend_ids(&self) -> Vec<i64> {
        self.state.lock().backends.iter().map(|b| b.id).collect()
    }

    /// Makes new connections fail.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    /// Makes every query on every connection fail.
    pub fn set_failing_queries(&self, failing: bool) {
        self.state.lock().failing_queries = failing;
    }

    /// Makes terminating connection `id` fail.
    pub fn fail_termination_of(&self, id: i64) {
        self.state.lock().failing_terminations.insert(id);
    }

    /// Makes the next `count` session inserts fail with an integrity violation.
    pub fn force_insert_conflicts(&self, count: usize) {
        self.state.lock().forced_conflicts = count;
    }

    /// Successful connects so far.
    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    /// Connections currently open.
    pub fn open_connections(&self) -> usize {
        self.state.lock().open_connections
    }

    pub(super) fn check_available(state: &MemoryState) -> Result<(), StorageError> {
        if state.failing_queries {
            return Err(StorageError::transient("query failed: injected fault"));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
