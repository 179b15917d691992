//! ConnectionPool - bounded, process-wide set of reusable connections.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ──▶ uninitialized ──initialize()──▶ live ──shutdown()──▶ uninitialized
//!                 ▲                            │
//!                 └── second initialize() is a logged no-op
//! ```
//!
//! Only the "create the pool" step is serialized behind a mutex
//! (check, lock, check again, create). `acquire` reads the live pool under a
//! short read lock and then waits on the semaphore without holding any lock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, error, info, warn};

use super::{ConnectionHandle, PoolConfig, PoolError};
use crate::ports::Connector;

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub name: String,
    /// Configured maximum number of live connections.
    pub size: usize,
    /// Connections currently open (idle + checked out).
    pub live: usize,
    /// Open connections waiting in the pool.
    pub idle: usize,
    /// Handles currently checked out.
    pub in_use: usize,
}

/// Gateway to a bounded set of backing-store connections.
///
/// Cloning is cheap; clones share the same state. Use [`super::global`] for
/// the process-wide PostgreSQL pool, or `ConnectionPool::new()` for an
/// isolated instance.
pub struct ConnectionPool<C: Connector> {
    slot: Arc<PoolSlot<C>>,
}

struct PoolSlot<C: Connector> {
    live: RwLock<Option<Arc<SharedPool<C>>>>,
    init_lock: tokio::sync::Mutex<()>,
}

impl<C: Connector> Clone for ConnectionPool<C> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<C: Connector> Default for ConnectionPool<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> ConnectionPool<C> {
    /// Creates an uninitialized pool.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(PoolSlot {
                live: RwLock::new(None),
                init_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Creates the underlying pool. First caller wins.
    ///
    /// Opens one connection eagerly so an unreachable backing store is
    /// reported here rather than on the first request. Later calls, including
    /// concurrent ones that lose the race, leave the live pool untouched and
    /// only log a warning.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidConfig` if `config` is unusable
    /// - `PoolError::Init` if the first connection cannot be opened
    pub async fn initialize(&self, connector: C, config: PoolConfig) -> Result<(), PoolError> {
        if self.is_initialized() {
            warn!(pool = %config.name, "Connection pool already initialized");
            return Ok(());
        }

        let _guard = self.slot.init_lock.lock().await;
        if self.is_initialized() {
            warn!(pool = %config.name, "Connection pool already initialized");
            return Ok(());
        }

        config.validate()?;

        let target = connector.describe();
        let first = connector.connect().await.map_err(|e| {
            error!(pool = %config.name, target = %target, error = %e, "Failed to initialize connection pool");
            PoolError::Init(e)
        })?;

        let shared = Arc::new(SharedPool::new(connector, config));
        shared.live_count.fetch_add(1, Ordering::SeqCst);
        shared.park(first);

        info!(
            pool = %shared.name,
            size = shared.size,
            target = %target,
            "Connection pool initialized"
        );
        *self.slot.live.write() = Some(shared);
        Ok(())
    }

    /// Returns true between a successful `initialize` and `shutdown`.
    pub fn is_initialized(&self) -> bool {
        self.slot.live.read().is_some()
    }

    /// Checks out a connection, waiting at most the configured acquire timeout.
    ///
    /// The connection goes back to the pool when the handle is dropped, on
    /// every exit path of the caller.
    ///
    /// # Errors
    ///
    /// - `PoolError::NotInitialized` before `initialize` or after `shutdown`
    /// - `PoolError::Exhausted` if no connection became free in time
    /// - `PoolError::Storage` if a new connection could not be opened
    pub async fn acquire(&self) -> Result<ConnectionHandle<C>, PoolError> {
        let shared = self.current().ok_or(PoolError::NotInitialized)?;
        SharedPool::checkout(shared).await
    }

    /// Current occupancy, or `None` when not initialized.
    pub fn status(&self) -> Option<PoolStatus> {
        self.current().map(|shared| shared.status())
    }

    /// Closes every idle connection and resets to the uninitialized state.
    ///
    /// Waiting `acquire` calls fail with `NotInitialized`; handles still
    /// checked out close their connection when dropped. Safe to call at any
    /// time, any number of times.
    pub async fn shutdown(&self) {
        let _guard = self.slot.init_lock.lock().await;
        let shared = self.slot.live.write().take();

        match shared {
            Some(shared) => {
                let closed = shared.close().await;
                info!(pool = %shared.name, closed, "Connection pool shut down");
            }
            None => debug!("Connection pool shutdown requested but pool was not initialized"),
        }
    }

    fn current(&self) -> Option<Arc<SharedPool<C>>> {
        self.slot.live.read().clone()
    }
}

struct IdleConnection<T> {
    connection: T,
    since: Instant,
}

/// State of one initialized pool. Handles keep it alive after `shutdown`.
pub(super) struct SharedPool<C: Connector> {
    name: String,
    size: usize,
    acquire_timeout: Duration,
    idle_timeout: Duration,
    connector: C,
    /// Most recently returned first; the oldest idle connections sit at the back.
    idle: Mutex<VecDeque<IdleConnection<C::Connection>>>,
    /// One permit per checked-out handle.
    limiter: Arc<Semaphore>,
    live_count: AtomicUsize,
    closed: AtomicBool,
}

impl<C: Connector> SharedPool<C> {
    fn new(connector: C, config: PoolConfig) -> Self {
        Self {
            limiter: Arc::new(Semaphore::new(config.size)),
            idle: Mutex::new(VecDeque::with_capacity(config.size)),
            name: config.name,
            size: config.size,
            acquire_timeout: config.acquire_timeout,
            idle_timeout: config.idle_timeout,
            connector,
            live_count: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub(super) fn name(&self) -> &str {
        &self.name
    }

    async fn checkout(self: Arc<Self>) -> Result<ConnectionHandle<C>, PoolError> {
        let permit = match time::timeout(
            self.acquire_timeout,
            Arc::clone(&self.limiter).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(PoolError::NotInitialized),
            Err(_) => {
                warn!(
                    pool = %self.name,
                    waited_ms = self.acquire_timeout.as_millis() as u64,
                    "Timed out waiting for a free connection"
                );
                return Err(PoolError::Exhausted {
                    waited: self.acquire_timeout,
                });
            }
        };

        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::NotInitialized);
        }

        let (reusable, stale) = self.take_idle();
        if !stale.is_empty() {
            debug!(pool = %self.name, count = stale.len(), "Closing stale idle connections");
            self.live_count.fetch_sub(stale.len(), Ordering::SeqCst);
            join_all(
                stale
                    .into_iter()
                    .map(|idle| self.connector.disconnect(idle.connection)),
            )
            .await;
        }

        let connection = match reusable {
            Some(connection) => connection,
            None => match self.connector.connect().await {
                Ok(connection) => {
                    self.live_count.fetch_add(1, Ordering::SeqCst);
                    connection
                }
                Err(e) => {
                    warn!(pool = %self.name, error = %e, "Failed to open pooled connection");
                    return Err(PoolError::Storage(e));
                }
            },
        };

        Ok(ConnectionHandle::new(connection, self, permit))
    }

    /// Pops the freshest reusable connection and every expired one.
    fn take_idle(&self) -> (Option<C::Connection>, Vec<IdleConnection<C::Connection>>) {
        let mut idle = self.idle.lock();
        let mut stale = Vec::new();
        while idle
            .back()
            .is_some_and(|oldest| oldest.since.elapsed() >= self.idle_timeout)
        {
            if let Some(expired) = idle.pop_back() {
                stale.push(expired);
            }
        }
        (idle.pop_front().map(|fresh| fresh.connection), stale)
    }

    fn park(&self, connection: C::Connection) {
        self.idle.lock().push_front(IdleConnection {
            connection,
            since: Instant::now(),
        });
    }

    /// Returns a connection from a dropped handle.
    pub(super) fn release(self: &Arc<Self>, connection: C::Connection) {
        let mut idle = self.idle.lock();
        if self.closed.load(Ordering::Acquire) {
            drop(idle);
            self.retire(connection);
            return;
        }
        idle.push_front(IdleConnection {
            connection,
            since: Instant::now(),
        });
    }

    /// Closes a connection that must not be reused.
    pub(super) fn retire(self: &Arc<Self>, connection: C::Connection) {
        self.live_count.fetch_sub(1, Ordering::SeqCst);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let shared = Arc::clone(self);
                runtime.spawn(async move {
                    shared.connector.disconnect(connection).await;
                });
            }
            Err(_) => drop(connection),
        }
    }

    async fn close(&self) -> usize {
        self.limiter.close();
        let drained: Vec<_> = {
            let mut idle = self.idle.lock();
            self.closed.store(true, Ordering::Release);
            idle.drain(..).collect()
        };
        let count = drained.len();
        self.live_count.fetch_sub(count, Ordering::SeqCst);
        join_all(
            drained
                .into_iter()
                .map(|idle| self.connector.disconnect(idle.connection)),
        )
        .await;
        count
    }

    fn status(&self) -> PoolStatus {
        PoolStatus {
            name: self.name.clone(),
            size: self.size,
            live: self.live_count.load(Ordering::SeqCst),
            idle: self.idle.lock().len(),
            in_use: self.size.saturating_sub(self.limiter.available_permits()),
        }
    }
}
