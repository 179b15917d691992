//! SessionCleanupScheduler - periodic sweep of expired sessions.
//!
//! The session store only deletes an expired row when someone looks it up.
//! Tokens that are never presented again would stay forever, so the binary
//! runs this scheduler alongside the HTTP server.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 1 h | Time between sweeps |
//!
//! The first sweep runs immediately. A failed sweep is logged by the store
//! and retried on the next tick.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::SessionStore;
use crate::ports::{Connector, SessionRows};

/// Default time between sweeps.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Calls `cleanup_expired_sessions` on a fixed cadence until shut down.
pub struct SessionCleanupScheduler<C: Connector> {
    store: SessionStore<C>,
    interval: Duration,
}

impl<C> SessionCleanupScheduler<C>
where
    C: Connector,
    C::Connection: SessionRows,
{
    pub fn new(store: SessionStore<C>) -> Self {
        Self {
            store,
            interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }

    /// Create scheduler with custom sweep interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run sweeps until the shutdown signal is received.
    ///
    /// Returns after the signal flips to `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.interval.as_secs(),
            "Session cleanup scheduler started"
        );

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                _ = ticker.tick() => {
                    let removed = self.store.cleanup_expired_sessions().await;
                    debug!(removed, "Session cleanup sweep finished");
                }
            }
        }

        info!("Session cleanup scheduler stopped");
    }

    /// Moves the scheduler onto its own task.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration as ChronoDuration;

    use crate::adapters::clock::ManualClock;
    use crate::adapters::memory::{MemoryConnector, MemoryStore};
    use crate::adapters::pool::{ConnectionPool, PoolConfig};
    use crate::domain::foundation::{Timestamp, UserId};

    async fn store() -> (SessionStore<MemoryConnector>, MemoryStore, ManualClock) {
        let backing = MemoryStore::new();
        let pool = ConnectionPool::new();
        pool.initialize(backing.connector(), PoolConfig::default().with_size(2))
            .await
            .unwrap();
        let clock = ManualClock::new(Timestamp::from_unix_secs(1_700_000_000));
        let store = SessionStore::new(pool, Arc::new(clock.clone()));
        (store, backing, clock)
    }

    #[test]
    fn default_interval_is_one_hour() {
        assert_eq!(DEFAULT_CLEANUP_INTERVAL, Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_on_every_tick_until_shutdown() {
        let (store, backing, clock) = store().await;
        store
            .create_session_with_ttl(UserId::new(1), ChronoDuration::hours(1))
            .await
            .unwrap();
        clock.advance(ChronoDuration::hours(2));

        let scheduler = SessionCleanupScheduler::new(store.clone())
            .with_interval(Duration::from_secs(60));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = scheduler.spawn(shutdown_rx);

        // First sweep runs immediately
        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(backing.session_count(), 0);

        store
            .create_session_with_ttl(UserId::new(2), ChronoDuration::hours(1))
            .await
            .unwrap();
        clock.advance(ChronoDuration::hours(2));
        time::sleep(Duration::from_secs(61)).await;
        assert_eq!(backing.session_count(), 0);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn live_sessions_survive_sweeps() {
        let (store, backing, _clock) = store().await;
        let token = store.create_session(UserId::new(1)).await.unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = SessionCleanupScheduler::new(store)
            .with_interval(Duration::from_secs(1))
            .spawn(shutdown_rx);

        time::sleep(Duration::from_secs(5)).await;
        assert!(backing.has_session(&token));

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn dropped_sender_stops_the_loop() {
        let (store, _backing, _clock) = store().await;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = SessionCleanupScheduler::new(store).spawn(shutdown_rx);

        drop(shutdown_tx);

        time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler should exit")
            .unwrap();
    }
}
