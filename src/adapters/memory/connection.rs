//! In-memory connector and connection.

use std::time::Duration;

use async_trait::async_trait;

use super::MemoryStore;
use crate::domain::foundation::{StorageError, Timestamp, UserId};
use crate::domain::session::{Session, SessionToken};
use crate::ports::{BackendConnection, ConnectionAdmin, Connector, SessionRows};

/// Opens connections to a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryConnector {
    store: MemoryStore,
}

impl MemoryConnector {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(&self) -> Result<MemoryConnection, StorageError> {
        let mut state = self.store.state.lock();
        if state.unreachable {
            return Err(StorageError::transient("connection refused"));
        }
        state.connects += 1;
        state.open_connections += 1;
        state.next_connection_id += 1;
        Ok(MemoryConnection {
            store: self.store.clone(),
            id: state.next_connection_id,
        })
    }

    async fn disconnect(&self, connection: MemoryConnection) {
        drop(connection);
    }

    fn describe(&self) -> String {
        format!("memory://{}", self.store.user)
    }
}

/// One open connection to a [`MemoryStore`].
pub struct MemoryConnection {
    store: MemoryStore,
    id: i64,
}

impl MemoryConnection {
    /// Connection id, unique within its store.
    pub fn id(&self) -> i64 {
        self.id
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        let mut state = self.store.state.lock();
        state.open_connections = state.open_connections.saturating_sub(1);
    }
}

#[async_trait]
impl SessionRows for MemoryConnection {
    async fn insert_session(&mut self, session: &Session) -> Result<(), StorageError> {
        let mut state = self.store.state.lock();
        MemoryStore::check_available(&state)?;
        if state.forced_conflicts > 0 {
            state.forced_conflicts -= 1;
            return Err(StorageError::integrity("duplicate key value violates unique constraint"));
        }
        if state.sessions.contains_key(session.token()) {
            return Err(StorageError::integrity("duplicate key value violates unique constraint"));
        }
        state
            .sessions
            .insert(session.token().clone(), session.clone());
        Ok(())
    }

    async fn find_session(
        &mut self,
        token: &SessionToken,
    ) -> Result<Option<Session>, StorageError> {
        let state = self.store.state.lock();
        MemoryStore::check_available(&state)?;
        Ok(state.sessions.get(token).cloned())
    }

    async fn delete_session(&mut self, token: &SessionToken) -> Result<bool, StorageError> {
        let mut state = self.store.state.lock();
        MemoryStore::check_available(&state)?;
        Ok(state.sessions.remove(token).is_some())
    }

    async fn delete_user_sessions(&mut self, user_id: UserId) -> Result<u64, StorageError> {
        let mut state = self.store.state.lock();
        MemoryStore::check_available(&state)?;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.user_id() != user_id);
        Ok((before - state.sessions.len()) as u64)
    }

    async fn delete_expired_sessions(&mut self, now: Timestamp) -> Result<u64, StorageError> {
        let mut state = self.store.state.lock();
        MemoryStore::check_available(&state)?;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.expires_at().is_before(&now));
        Ok((before - state.sessions.len()) as u64)
    }
}

#[async_trait]
impl ConnectionAdmin for MemoryConnection {
    async fn idle_connections(
        &mut self,
        idle_longer_than: Duration,
    ) -> Result<Vec<BackendConnection>, StorageError> {
        let state = self.store.state.lock();
        MemoryStore::check_available(&state)?;
        Ok(state
            .backends
            .iter()
            .filter(|b| b.user == self.store.user && b.idle_for > idle_longer_than)
            .cloned()
            .collect())
    }

    async fn terminate_connection(&mut self, id: i64) -> Result<bool, StorageError> {
        let mut state = self.store.state.lock();
        MemoryStore::check_available(&state)?;
        if state.failing_terminations.contains(&id) {
            return Err(StorageError::transient(format!(
                "permission denied to terminate connection {}",
                id
            )));
        }
        let before = state.backends.len();
        state.backends.retain(|b| b.id != id);
        Ok(state.backends.len() < before)
    }
}
