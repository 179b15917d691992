//! IdleConnectionReaper - background task that kills leaked idle connections.
//!
//! The pool only knows about connections it handed out. A caller that leaks a
//! connection at the storage level (or another process sharing the same
//! credential) can still exhaust the server's connection limit. Each tick
//! the reaper borrows one pooled connection, asks the server which
//! connections owned by the pool's credential have been idle past the
//! threshold, and terminates them one by one.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 5 min | Time between ticks |
//! | `idle_threshold` | 1 h | Idle time after which a connection is terminated |
//! | stop timeout | 5 s | How long `stop` waits for the task to finish |
//!
//! ## Failure handling
//!
//! Nothing escapes the loop. Acquire, query and termination failures are
//! logged and the loop waits for the next tick; a missed reap is fine, a dead
//! reaper is not. A stop request also ends a tick that is still waiting for
//! a free connection.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::{ConnectionHandle, ConnectionPool, PoolError};
use crate::ports::{ConnectionAdmin, Connector};

/// Default time between reaper ticks.
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(300);

/// Default idle time after which a connection is terminated.
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(3600);

/// Default bound on how long `stop` waits for the task.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

const MIN_REAP_INTERVAL: Duration = Duration::from_millis(1);

/// Outcome of one reaper tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapReport {
    /// Connections over the threshold reported by the server.
    pub found: usize,
    /// Connections successfully terminated.
    pub terminated: usize,
    /// Terminations that failed.
    pub failed: usize,
}

struct ReaperTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Periodically terminates storage-side connections idle beyond a threshold.
pub struct IdleConnectionReaper<C: Connector> {
    pool: ConnectionPool<C>,
    idle_threshold: Duration,
    task: Mutex<Option<ReaperTask>>,
}

impl<C> IdleConnectionReaper<C>
where
    C: Connector,
    C::Connection: ConnectionAdmin,
{
    /// Creates a stopped reaper using the default idle threshold.
    pub fn new(pool: ConnectionPool<C>) -> Self {
        Self {
            pool,
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            task: Mutex::new(None),
        }
    }

    /// Create reaper with custom idle threshold.
    pub fn with_idle_threshold(mut self, threshold: Duration) -> Self {
        self.idle_threshold = threshold;
        self
    }

    pub fn idle_threshold(&self) -> Duration {
        self.idle_threshold
    }

    /// Launches the background task unless it is already running.
    ///
    /// The first tick runs immediately. Must be called from within a Tokio
    /// runtime.
    pub fn start(&self, interval: Duration) {
        let mut task = self.task.lock();
        if let Some(running) = task.as_ref().filter(|t| !t.handle.is_finished()) {
            if *running.shutdown.borrow() {
                warn!("Previous idle connection reaper is still stopping; not starting another");
            } else {
                warn!("Idle connection reaper already running");
            }
            return;
        }

        let interval = interval.max(MIN_REAP_INTERVAL);
        let (shutdown, signal) = watch::channel(false);
        let handle = tokio::spawn(run(
            self.pool.clone(),
            self.idle_threshold,
            interval,
            signal,
        ));
        *task = Some(ReaperTask { shutdown, handle });

        info!(
            interval_secs = interval.as_secs(),
            idle_threshold_secs = self.idle_threshold.as_secs(),
            "Idle connection reaper started"
        );
    }

    /// Returns true while the background task is alive.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Signals the task to stop and waits up to `timeout` for it.
    ///
    /// A task still busy after `timeout` keeps its slot, so `is_running`
    /// stays true and `start` will not spawn a second loop until it exits.
    pub async fn stop(&self, timeout: Duration) {
        let task = self.task.lock().take();
        let Some(ReaperTask {
            shutdown,
            mut handle,
        }) = task
        else {
            debug!("Idle connection reaper stop requested but it was not running");
            return;
        };

        let _ = shutdown.send(true);
        match time::timeout(timeout, &mut handle).await {
            Ok(Ok(())) => info!("Idle connection reaper stopped"),
            Ok(Err(e)) => warn!(error = %e, "Idle connection reaper task ended abnormally"),
            Err(_) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Idle connection reaper did not stop in time; continuing shutdown"
                );
                let mut slot = self.task.lock();
                if slot.is_none() {
                    *slot = Some(ReaperTask { shutdown, handle });
                }
            }
        }
    }

    /// Runs exactly one reap pass.
    ///
    /// This is also what the background loop calls each tick.
    pub async fn reap_once(&self) -> ReapReport {
        reap_idle_connections(&self.pool, self.idle_threshold).await
    }
}

async fn run<C>(
    pool: ConnectionPool<C>,
    idle_threshold: Duration,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    C: Connector,
    C::Connection: ConnectionAdmin,
{
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }

            _ = ticker.tick() => {
                // Waiting for a free connection is abandoned on shutdown;
                // once one is held the tick runs to completion.
                let acquired = tokio::select! {
                    biased;
                    _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => None,
                    acquired = pool.acquire() => Some(acquired),
                };
                let Some(acquired) = acquired else {
                    break;
                };

                let tick = AssertUnwindSafe(reap_with(acquired, idle_threshold));
                if tick.catch_unwind().await.is_err() {
                    error!("Idle connection reaper tick panicked");
                }
            }
        }
    }

    debug!("Idle connection reaper loop exited");
}

async fn reap_idle_connections<C>(pool: &ConnectionPool<C>, idle_threshold: Duration) -> ReapReport
where
    C: Connector,
    C::Connection: ConnectionAdmin,
{
    reap_with(pool.acquire().await, idle_threshold).await
}

async fn reap_with<C>(
    acquired: Result<ConnectionHandle<C>, PoolError>,
    idle_threshold: Duration,
) -> ReapReport
where
    C: Connector,
    C::Connection: ConnectionAdmin,
{
    let mut report = ReapReport::default();

    let mut conn = match acquired {
        Ok(conn) => conn,
        Err(e) => {
            warn!(error = %e, "Idle connection reaper could not acquire a connection");
            return report;
        }
    };

    let idle = match conn.idle_connections(idle_threshold).await {
        Ok(idle) => idle,
        Err(e) => {
            error!(pool = %conn.pool_name(), error = %e, "Failed to list idle connections");
            conn.discard();
            return report;
        }
    };

    report.found = idle.len();
    for backend in idle {
        match conn.terminate_connection(backend.id).await {
            Ok(true) => {
                report.terminated += 1;
                debug!(
                    pid = backend.id,
                    idle_secs = backend.idle_for.as_secs(),
                    "Terminated idle connection"
                );
            }
            Ok(false) => debug!(pid = backend.id, "Idle connection already gone"),
            Err(e) => {
                report.failed += 1;
                warn!(pid = backend.id, error = %e, "Failed to terminate idle connection");
            }
        }
    }

    if report.terminated > 0 || report.failed > 0 {
        info!(
            found = report.found,
            terminated = report.terminated,
            failed = report.failed,
            "Reaped idle connections"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryConnector, MemoryStore};
    use crate::adapters::pool::PoolConfig;

    const HOUR: Duration = Duration::from_secs(3600);

    async fn reaper_for(store: &MemoryStore) -> IdleConnectionReaper<MemoryConnector> {
        let pool = ConnectionPool::new();
        pool.initialize(store.connector(), PoolConfig::default().with_size(2))
            .await
            .unwrap();
        IdleConnectionReaper::new(pool)
    }

    #[tokio::test]
    async fn tick_with_nothing_idle_terminates_nothing() {
        let store = MemoryStore::new();
        store.add_backend(10, MemoryStore::DEFAULT_USER, Duration::from_secs(60));
        let reaper = reaper_for(&store).await;

        let report = reaper.reap_once().await;

        assert_eq!(report, ReapReport::default());
        assert_eq!(store.backend_ids(), vec![10]);
    }

    #[tokio::test]
    async fn tick_terminates_connections_over_threshold() {
        let store = MemoryStore::new();
        store.add_backend(1, MemoryStore::DEFAULT_USER, 2 * HOUR);
        store.add_backend(2, MemoryStore::DEFAULT_USER, Duration::from_secs(30));
        store.add_backend(3, MemoryStore::DEFAULT_USER, 3 * HOUR);
        let reaper = reaper_for(&store).await;

        let report = reaper.reap_once().await;

        assert_eq!(report.found, 2);
        assert_eq!(report.terminated, 2);
        assert_eq!(store.backend_ids(), vec![2]);
    }

    #[tokio::test]
    async fn tick_ignores_other_credentials() {
        let store = MemoryStore::new();
        store.add_backend(1, "replication", 5 * HOUR);
        let reaper = reaper_for(&store).await;

        let report = reaper.reap_once().await;

        assert_eq!(report.found, 0);
        assert_eq!(store.backend_ids(), vec![1]);
    }

    #[tokio::test]
    async fn failed_termination_does_not_stop_the_rest() {
        let store = MemoryStore::new();
        store.add_backend(1, MemoryStore::DEFAULT_USER, 2 * HOUR);
        store.add_backend(2, MemoryStore::DEFAULT_USER, 2 * HOUR);
        store.add_backend(3, MemoryStore::DEFAULT_USER, 2 * HOUR);
        store.fail_termination_of(2);
        let reaper = reaper_for(&store).await;

        let report = reaper.reap_once().await;

        assert_eq!(report.found, 3);
        assert_eq!(report.terminated, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(store.backend_ids(), vec![2]);
    }

    #[tokio::test]
    async fn custom_threshold_is_honoured() {
        let store = MemoryStore::new();
        store.add_backend(1, MemoryStore::DEFAULT_USER, Duration::from_secs(120));
        let reaper = reaper_for(&store)
            .await
            .with_idle_threshold(Duration::from_secs(60));

        assert_eq!(reaper.reap_once().await.terminated, 1);
    }

    #[tokio::test]
    async fn tick_survives_query_failure_and_returns_connection_slot() {
        let store = MemoryStore::new();
        store.set_failing_queries(true);
        let reaper = reaper_for(&store).await;

        let report = reaper.reap_once().await;

        assert_eq!(report, ReapReport::default());
        assert_eq!(reaper.pool.status().unwrap().in_use, 0);
    }

    #[tokio::test]
    async fn tick_survives_uninitialized_pool() {
        let reaper: IdleConnectionReaper<MemoryConnector> =
            IdleConnectionReaper::new(ConnectionPool::new());

        assert_eq!(reaper.reap_once().await, ReapReport::default());
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent_and_stop_ends_task() {
        let store = MemoryStore::new();
        let reaper = reaper_for(&store).await;

        reaper.start(Duration::from_secs(300));
        reaper.start(Duration::from_secs(300));
        assert!(reaper.is_running());

        reaper.stop(DEFAULT_STOP_TIMEOUT).await;
        assert!(!reaper.is_running());

        // Stopping twice is harmless.
        reaper.stop(DEFAULT_STOP_TIMEOUT).await;
    }

    #[tokio::test(start_paused = true)]
    async fn background_loop_reaps_on_each_tick() {
        let store = MemoryStore::new();
        let reaper = reaper_for(&store).await;
        reaper.start(Duration::from_secs(60));

        store.add_backend(7, MemoryStore::DEFAULT_USER, 2 * HOUR);
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(store.backend_ids().is_empty());
        reaper.stop(DEFAULT_STOP_TIMEOUT).await;
    }

    #[tokio::test(start_paused = true)]
    async fn loop_keeps_running_after_failures() {
        let store = MemoryStore::new();
        let reaper = reaper_for(&store).await;
        store.set_failing_queries(true);
        reaper.start(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert!(reaper.is_running());

        store.set_failing_queries(false);
        store.add_backend(4, MemoryStore::DEFAULT_USER, 2 * HOUR);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(store.backend_ids().is_empty());
        reaper.stop(DEFAULT_STOP_TIMEOUT).await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_start_is_a_no_op() {
        let store = MemoryStore::new();
        let reaper = reaper_for(&store).await;

        reaper.stop(Duration::from_millis(10)).await;

        assert!(!reaper.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop_spawns_new_task() {
        let store = MemoryStore::new();
        let reaper = reaper_for(&store).await;

        reaper.start(Duration::from_secs(30));
        reaper.stop(DEFAULT_STOP_TIMEOUT).await;
        reaper.start(Duration::from_secs(30));

        assert!(reaper.is_running());
        reaper.stop(DEFAULT_STOP_TIMEOUT).await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_tick_waiting_for_a_connection() {
        let store = MemoryStore::new();
        let pool = ConnectionPool::new();
        pool.initialize(store.connector(), PoolConfig::default().with_size(1))
            .await
            .unwrap();
        let reaper = IdleConnectionReaper::new(pool.clone());
        let held = pool.acquire().await.unwrap();

        reaper.start(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(5)).await;
        reaper.stop(Duration::from_millis(10)).await;
        assert!(!reaper.is_running());

        drop(held);
        store.add_backend(9, MemoryStore::DEFAULT_USER, 2 * HOUR);
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(store.backend_ids(), vec![9]);
    }
}
