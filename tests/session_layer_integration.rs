//! Integration tests for the resource and session layer.
//!
//! These tests drive the public API end to end:
//! 1. The pool bounds concurrent checkouts and recovers after shutdown
//! 2. The session store issues, expires and revokes tokens through the pool
//! 3. The reaper and the cleanup scheduler run alongside request traffic
//!
//! Uses the in-memory backing store so no database is required.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tokio::sync::watch;

use tutor_hub::adapters::clock::ManualClock;
use tutor_hub::adapters::memory::{MemoryConnector, MemoryStore};
use tutor_hub::adapters::pool::{ConnectionPool, IdleConnectionReaper, PoolConfig, PoolError};
use tutor_hub::application::{SessionCleanupScheduler, SessionStore, SessionStoreError};
use tutor_hub::domain::foundation::{Timestamp, UserId};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    backing: MemoryStore,
    pool: ConnectionPool<MemoryConnector>,
    clock: ManualClock,
    store: SessionStore<MemoryConnector>,
}

async fn harness(config: PoolConfig) -> Harness {
    let backing = MemoryStore::new();
    let pool = ConnectionPool::new();
    pool.initialize(backing.connector(), config).await.unwrap();
    let clock = ManualClock::new(Timestamp::from_unix_secs(1_700_000_000));
    let store = SessionStore::new(pool.clone(), Arc::new(clock.clone()));
    Harness {
        backing,
        pool,
        clock,
        store,
    }
}

// =============================================================================
// Pool
// =============================================================================

#[tokio::test]
async fn third_caller_waits_for_a_release_then_succeeds() {
    let h = harness(PoolConfig::default().with_size(2)).await;

    let first = h.pool.acquire().await.unwrap();
    let second = h.pool.acquire().await.unwrap();

    let pool = h.pool.clone();
    let waiter = tokio::spawn(async move { pool.acquire().await.map(|c| c.id()) });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    let released_id = first.id();
    drop(first);

    let got = tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("waiter should not hang")
        .unwrap()
        .unwrap();
    assert_eq!(got, released_id);
    drop(second);
}

#[tokio::test(start_paused = true)]
async fn third_caller_times_out_when_nothing_is_released() {
    let h = harness(
        PoolConfig::default()
            .with_size(2)
            .with_acquire_timeout(Duration::from_secs(2)),
    )
    .await;

    let _first = h.pool.acquire().await.unwrap();
    let _second = h.pool.acquire().await.unwrap();

    let result = h.pool.acquire().await;

    assert!(matches!(result, Err(PoolError::Exhausted { .. })));
}

#[tokio::test]
async fn store_reports_exhaustion_through_try_variants() {
    let h = harness(
        PoolConfig::default()
            .with_size(1)
            .with_acquire_timeout(Duration::from_millis(50)),
    )
    .await;
    let _held = h.pool.acquire().await.unwrap();

    let result = h.store.try_create_session(UserId::new(1)).await;

    match result {
        Err(SessionStoreError::Pool(e @ PoolError::Exhausted { .. })) => assert!(e.is_retryable()),
        other => panic!("expected exhaustion, got {:?}", other),
    }
    assert!(h.store.create_session(UserId::new(1)).await.is_none());
}

#[tokio::test]
async fn pool_restarts_after_shutdown() {
    let h = harness(PoolConfig::default().with_size(2)).await;
    let token = h.store.create_session(UserId::new(8)).await.unwrap();

    h.pool.shutdown().await;
    assert!(matches!(h.pool.acquire().await, Err(PoolError::NotInitialized)));
    assert_eq!(h.store.validate_session(token.as_str()).await, None);

    h.pool
        .initialize(h.backing.connector(), PoolConfig::default())
        .await
        .unwrap();
    assert_eq!(
        h.store.validate_session(token.as_str()).await,
        Some(UserId::new(8))
    );
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test]
async fn many_concurrent_sessions_through_a_small_pool() {
    let h = harness(PoolConfig::default().with_size(3)).await;

    let mut tasks = Vec::new();
    for user in 0..20 {
        let store = h.store.clone();
        tasks.push(tokio::spawn(async move {
            let token = store.create_session(UserId::new(user)).await.unwrap();
            let resolved = store.validate_session(token.as_str()).await;
            (user, resolved)
        }));
    }

    for task in tasks {
        let (user, resolved) = task.await.unwrap();
        assert_eq!(resolved, Some(UserId::new(user)));
    }
    let status = h.pool.status().unwrap();
    assert!(status.live <= 3);
    assert_eq!(status.in_use, 0);
    assert_eq!(h.backing.session_count(), 20);
}

#[tokio::test]
async fn expiry_then_cleanup_leaves_only_live_sessions() {
    let h = harness(PoolConfig::default()).await;
    let short = h
        .store
        .create_session_with_ttl(UserId::new(1), ChronoDuration::hours(1))
        .await
        .unwrap();
    let long = h.store.create_session(UserId::new(2)).await.unwrap();

    h.clock.advance(ChronoDuration::hours(2));

    assert_eq!(h.store.validate_session(short.as_str()).await, None);
    assert_eq!(h.store.validate_session(short.as_str()).await, None);
    assert_eq!(h.store.cleanup_expired_sessions().await, 0);
    assert_eq!(
        h.store.validate_session(long.as_str()).await,
        Some(UserId::new(2))
    );
}

// =============================================================================
// Background tasks
// =============================================================================

#[tokio::test]
async fn reaper_runs_alongside_session_traffic() {
    let h = harness(PoolConfig::default().with_size(2)).await;
    h.backing
        .add_backend(100, MemoryStore::DEFAULT_USER, Duration::from_secs(7200));
    h.backing
        .add_backend(101, MemoryStore::DEFAULT_USER, Duration::from_secs(60));
    h.backing
        .add_backend(102, "reporting", Duration::from_secs(7200));

    let reaper = IdleConnectionReaper::new(h.pool.clone());
    reaper.start(Duration::from_millis(10));

    for user in 0..10 {
        let token = h.store.create_session(UserId::new(user)).await.unwrap();
        assert!(h.store.delete_session(token.as_str()).await);
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    reaper.stop(Duration::from_secs(5)).await;
    assert!(!reaper.is_running());
    assert_eq!(h.backing.backend_ids(), vec![101, 102]);
}

#[tokio::test]
async fn cleanup_scheduler_sweeps_until_signalled() {
    let h = harness(PoolConfig::default()).await;
    for ttl in [1, 2, 3] {
        h.store
            .create_session_with_ttl(UserId::new(ttl), ChronoDuration::hours(ttl))
            .await
            .unwrap();
    }
    h.clock.advance(ChronoDuration::hours(5));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = SessionCleanupScheduler::new(h.store.clone())
        .with_interval(Duration::from_millis(10))
        .spawn(shutdown_rx);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.backing.session_count(), 0);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler should stop")
        .unwrap();
}
