//! State machine scenarios for the shared circuit breaker.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use futures_util::future::join_all;
use thiserror::Error;

use shared_breaker::resilience::{
    BreakerConfig, BreakerOpenError, BreakerProfiles, BreakerState, BreakerStatus,
    CircuitBreaker, CircuitBreakerRegistry, ManualClock,
};
use shared_breaker::store::{InMemoryStore, StateStore};

mod common;

#[derive(Debug, Error, PartialEq)]
enum DbError {
    #[error(transparent)]
    Unavailable(#[from] BreakerOpenError),
    #[error("DB Error")]
    Query,
}

struct Harness {
    registry: CircuitBreakerRegistry,
    clock: Arc<ManualClock>,
    store: InMemoryStore,
}

fn harness() -> Harness {
    let store = InMemoryStore::new();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let registry = CircuitBreakerRegistry::new(Arc::new(store.clone())).with_clock(clock.clone());
    Harness { registry, clock, store }
}

/// Work that counts its invocations and always fails.
async fn failing(cb: &CircuitBreaker, calls: &AtomicU32) -> Result<(), DbError> {
    cb.execute(|| async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(DbError::Query)
    })
    .await
}

async fn succeeding(cb: &CircuitBreaker, calls: &AtomicU32) -> Result<&'static str, DbError> {
    cb.execute(|| async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok("success")
    })
    .await
}

async fn stored(h: &Harness, cb: &CircuitBreaker) -> BreakerState {
    h.store.get(cb.store_key()).await.unwrap().unwrap_or_default()
}

#[tokio::test]
async fn test_example_scenario() {
    let h = harness();
    let cb = h.registry.for_database("x");
    let calls = AtomicU32::new(0);

    for _ in 0..4 {
        assert_eq!(failing(&cb, &calls).await, Err(DbError::Query));
        assert_eq!(cb.state().await, BreakerStatus::Closed);
    }

    assert_eq!(failing(&cb, &calls).await, Err(DbError::Query));
    assert_eq!(cb.state().await, BreakerStatus::Open);

    let err = failing(&cb, &calls).await.unwrap_err();
    assert_eq!(err, DbError::Unavailable(BreakerOpenError::new("db:x")));
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    h.clock.advance(Duration::from_millis(30_000));
    assert_eq!(succeeding(&cb, &calls).await, Ok("success"));
    assert_eq!(cb.state().await, BreakerStatus::Closed);
}

#[tokio::test]
async fn test_trips_exactly_at_threshold() {
    let h = harness();
    let cb = h.registry.for_external_api("payment-gateway");
    let calls = AtomicU32::new(0);

    for i in 1..10 {
        let _ = failing(&cb, &calls).await;
        let state = stored(&h, &cb).await;
        assert_eq!(state.status, BreakerStatus::Closed);
        assert_eq!(state.failure_count, i);
    }

    let _ = failing(&cb, &calls).await;
    let state = stored(&h, &cb).await;
    assert_eq!(state.status, BreakerStatus::Open);
    assert_eq!(state.failure_count, 10);
    assert_eq!(state.next_attempt_at, 1_700_000_000_000 + 60_000);
}

#[tokio::test]
async fn test_fast_fail_never_invokes_work() {
    let h = harness();
    let cb = h.registry.for_database("wallets-db");
    let calls = AtomicU32::new(0);

    for _ in 0..5 {
        let _ = failing(&cb, &calls).await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    for _ in 0..20 {
        h.clock.advance(Duration::from_millis(1_000));
        let err = succeeding(&cb, &calls).await.unwrap_err();
        assert!(matches!(err, DbError::Unavailable(_)));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    // 20s into a 30s cool-down
    assert_eq!(cb.state().await, BreakerStatus::Open);
}

#[tokio::test]
async fn test_cooldown_persists_half_open_before_probe() {
    let h = harness();
    let cb = Arc::new(
        CircuitBreaker::new(
            "db:probe",
            BreakerConfig::new(1, Duration::from_millis(100)),
            Arc::new(h.store.clone()),
        )
        .with_clock(h.clock.clone()),
    );
    let calls = AtomicU32::new(0);
    let _ = failing(&cb, &calls).await;
    h.clock.advance(Duration::from_millis(100));

    let store = h.store.clone();
    let key = cb.store_key().to_string();
    let observed = cb
        .execute(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            // The store already says half-open while the probe is in flight
            let during = store.get(&key).await.unwrap().unwrap();
            Ok::<_, DbError>((during, calls.load(Ordering::SeqCst)))
        })
        .await
        .unwrap();

    assert_eq!(observed.0.status, BreakerStatus::HalfOpen);
    assert_eq!(observed.0.failure_count, 1);
    assert_eq!(observed.1, 2);
    assert_eq!(stored(&h, &cb).await, BreakerState::closed());
}

#[tokio::test]
async fn test_half_open_failure_reopens_with_fresh_deadline() {
    let h = harness();
    let cb = h.registry.for_database("ledger-db");
    let calls = AtomicU32::new(0);

    for _ in 0..5 {
        let _ = failing(&cb, &calls).await;
    }
    h.clock.advance(Duration::from_millis(30_000));
    assert_eq!(cb.state().await, BreakerStatus::HalfOpen);

    assert_eq!(failing(&cb, &calls).await, Err(DbError::Query));
    let state = stored(&h, &cb).await;
    assert_eq!(state.status, BreakerStatus::Open);
    assert_eq!(state.failure_count, 5);
    assert_eq!(state.next_attempt_at, 1_700_000_000_000 + 30_000 + 30_000);
    assert_eq!(cb.state().await, BreakerStatus::Open);
    assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_success_resets_failure_count() {
    let h = harness();
    let cb = h.registry.for_database("goals-db");
    let calls = AtomicU32::new(0);

    for _ in 0..3 {
        let _ = failing(&cb, &calls).await;
    }
    assert_eq!(stored(&h, &cb).await.failure_count, 3);

    succeeding(&cb, &calls).await.unwrap();
    assert_eq!(stored(&h, &cb).await, BreakerState::closed());

    // Counting starts over: four more failures stay closed
    for _ in 0..4 {
        let _ = failing(&cb, &calls).await;
    }
    assert_eq!(cb.state().await, BreakerStatus::Closed);
}

#[tokio::test]
async fn test_state_query_does_not_write() {
    let h = harness();
    let cb = h.registry.for_database("wealth-db");
    let calls = AtomicU32::new(0);
    for _ in 0..5 {
        let _ = failing(&cb, &calls).await;
    }
    h.clock.advance(Duration::from_secs(60));

    assert_eq!(cb.state().await, BreakerStatus::HalfOpen);
    assert_eq!(cb.snapshot().await.status, BreakerStatus::HalfOpen);
    assert_eq!(stored(&h, &cb).await.status, BreakerStatus::Open);
}

#[tokio::test]
async fn test_registry_singleton_and_isolation() {
    let h = harness();
    let a = h.registry.for_database("contacts-db");
    let b = h.registry.for_database("contacts-db");
    let other = h.registry.for_database("accounts-db");
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.store_key(), b.store_key());

    let calls = AtomicU32::new(0);
    for _ in 0..5 {
        let _ = failing(&a, &calls).await;
    }
    assert_eq!(b.state().await, BreakerStatus::Open);
    assert_eq!(other.state().await, BreakerStatus::Closed);
    assert_eq!(succeeding(&other, &calls).await, Ok("success"));
}

#[tokio::test]
async fn test_instances_coordinate_through_shared_store() {
    let store = InMemoryStore::new();
    let clock = Arc::new(ManualClock::new(0));
    let profiles = BreakerProfiles {
        database: BreakerConfig::new(2, Duration::from_secs(5)),
        ..BreakerProfiles::default()
    };
    let instance_a = CircuitBreakerRegistry::new(Arc::new(store.clone()))
        .with_clock(clock.clone())
        .with_profiles(profiles);
    let instance_b = CircuitBreakerRegistry::new(Arc::new(store.clone()))
        .with_clock(clock.clone())
        .with_profiles(profiles);

    let calls = AtomicU32::new(0);
    let _ = failing(&instance_a.for_database("tx-db"), &calls).await;
    let _ = failing(&instance_b.for_database("tx-db"), &calls).await;

    // Two failures from two instances trip the one logical circuit
    let err = succeeding(&instance_a.for_database("tx-db"), &calls).await.unwrap_err();
    assert!(matches!(err, DbError::Unavailable(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    instance_b.for_database("tx-db").reset().await;
    assert_eq!(instance_a.for_database("tx-db").state().await, BreakerStatus::Closed);
}

#[tokio::test]
async fn test_concurrent_probes_are_allowed() {
    let h = harness();
    let cb = h.registry.for_database("reports-db");
    let calls = AtomicU32::new(0);
    for _ in 0..5 {
        let _ = failing(&cb, &calls).await;
    }
    h.clock.advance(Duration::from_secs(30));

    let probes = AtomicU32::new(0);
    let results = join_all((0..4).map(|_| {
        cb.execute(|| async {
            probes.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok::<_, DbError>(())
        })
    }))
    .await;

    // Every caller that saw the expired deadline went through; none were
    // rejected and the circuit ends closed.
    assert!(results.iter().all(|r| r.is_ok()));
    assert!(probes.load(Ordering::SeqCst) >= 1);
    assert_eq!(cb.state().await, BreakerStatus::Closed);
}

#[tokio::test]
async fn test_boxed_dyn_errors() {
    let h = harness();
    let cb = h.registry.for_external_api("fx-rates");
    for _ in 0..10 {
        let _: Result<(), Box<dyn std::error::Error + Send + Sync>> =
            cb.execute(|| async { Err("timeout".into()) }).await;
    }

    let err: Box<dyn std::error::Error + Send + Sync> =
        cb.execute(|| async { Ok::<_, Box<dyn std::error::Error + Send + Sync>>(()) }).await.unwrap_err();
    let open = err.downcast_ref::<BreakerOpenError>().unwrap();
    assert_eq!(open.breaker(), "api:fx-rates");
}

#[tokio::test]
async fn test_unreachable_store_degrades_to_local_state() {
    let store = Arc::new(common::FailingStore::default());
    let clock = Arc::new(ManualClock::new(0));
    let registry = CircuitBreakerRegistry::new(store.clone()).with_clock(clock.clone());
    let cb = registry.for_database("contacts-db");
    let calls = AtomicU32::new(0);

    assert_eq!(succeeding(&cb, &calls).await, Ok("success"));
    for _ in 0..5 {
        assert_eq!(failing(&cb, &calls).await, Err(DbError::Query));
    }
    assert_eq!(cb.state().await, BreakerStatus::Open);
    assert!(matches!(failing(&cb, &calls).await, Err(DbError::Unavailable(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 6);

    clock.advance(Duration::from_secs(30));
    assert_eq!(succeeding(&cb, &calls).await, Ok("success"));
    assert_eq!(cb.state().await, BreakerStatus::Closed);
    assert!(store.calls.load(Ordering::SeqCst) > 0);
}
