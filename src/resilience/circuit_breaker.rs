//! Circuit breaker for dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: cool-down elapsed, calls probe the dependency
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: first execute() after next_attempt_at (persisted)
//! Half-Open → Closed: probe succeeds
//! Half-Open → Open: probe fails (count forced to threshold)
//! ```
//!
//! # Design Decisions
//! - State lives in the shared store so every instance sees the same circuit
//! - read → decide → call → write is not atomic; concurrent probes are allowed
//! - No timeout around the protected call; that belongs to the caller
//! - Store failures degrade to a local copy instead of failing the call

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use serde::{Deserialize, Serialize};

use crate::observability::metrics;
use crate::resilience::clock::{Clock, SystemClock};
use crate::resilience::error::BreakerOpenError;
use crate::resilience::state::{BreakerConfig, BreakerState, BreakerStatus};
use crate::store::StateStore;

/// Default prefix for store keys.
pub const DEFAULT_KEY_PREFIX: &str = "cb";

/// Point-in-time view of a breaker, for dashboards and the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    pub key: String,
    /// Effective status (expired open reads as half-open).
    pub status: BreakerStatus,
    pub failure_count: u32,
    pub next_attempt_at: u64,
    pub failure_threshold: u32,
    pub reset_timeout_ms: u64,
}

/// One named circuit over shared state.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    store_key: String,
    config: BreakerConfig,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    /// Last state seen or written; used when the store is unreachable.
    local: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a breaker backed by `store`, using the system clock.
    pub fn new(name: impl Into<String>, config: BreakerConfig, store: Arc<dyn StateStore>) -> Self {
        let name = name.into();
        Self {
            store_key: format!("{}:{}", DEFAULT_KEY_PREFIX, name),
            name,
            config,
            store,
            clock: Arc::new(SystemClock),
            local: Mutex::new(BreakerState::closed()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_key_prefix(mut self, prefix: &str) -> Self {
        self.store_key = format!("{}:{}", prefix, self.name);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key under which the state is stored, e.g. `cb:db:contacts-db`.
    pub fn store_key(&self) -> &str {
        &self.store_key
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Run `work` under the breaker.
    ///
    /// Returns `BreakerOpenError` (converted into `E`) without calling `work`
    /// while the circuit is open. Otherwise calls `work` exactly once, records
    /// the outcome and returns its result unchanged.
    pub async fn execute<F, Fut, T, E>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<BreakerOpenError>,
    {
        let mut state = self.load().await;

        if state.status == BreakerStatus::Open {
            if state.effective_status(self.clock.now_millis()) == BreakerStatus::Open {
                tracing::debug!(
                    breaker = %self.name,
                    next_attempt_at = state.next_attempt_at,
                    "Circuit open, rejecting call"
                );
                metrics::record_rejection(&self.name);
                return Err(BreakerOpenError::new(&self.name).into());
            }

            state.status = BreakerStatus::HalfOpen;
            self.save(state).await;
            self.record_transition(BreakerStatus::Open, BreakerStatus::HalfOpen);
        }

        match work().await {
            Ok(value) => {
                if state.needs_reset_on_success() {
                    let next = state.on_success();
                    self.save(next).await;
                    if next.status != state.status {
                        self.record_transition(state.status, next.status);
                    }
                }
                Ok(value)
            }
            Err(err) => {
                metrics::record_failure(&self.name);
                let next = state.on_failure(&self.config, self.clock.now_millis());
                self.save(next).await;
                if next.status != state.status {
                    self.record_transition(state.status, next.status);
                } else {
                    tracing::debug!(
                        breaker = %self.name,
                        failure_count = next.failure_count,
                        failure_threshold = self.config.failure_threshold,
                        "Protected call failed"
                    );
                }
                Err(err)
            }
        }
    }

    /// Current effective status. Reads the store but never writes to it.
    pub async fn state(&self) -> BreakerStatus {
        let state = self.load().await;
        state.effective_status(self.clock.now_millis())
    }

    /// Full view of the current state.
    pub async fn snapshot(&self) -> BreakerSnapshot {
        let state = self.load().await;
        BreakerSnapshot {
            key: self.name.clone(),
            status: state.effective_status(self.clock.now_millis()),
            failure_count: state.failure_count,
            next_attempt_at: state.next_attempt_at,
            failure_threshold: self.config.failure_threshold,
            reset_timeout_ms: self.config.reset_timeout_ms(),
        }
    }

    /// Force the circuit closed with no recorded failures.
    ///
    /// Meant for test harnesses and operational recovery.
    pub async fn reset(&self) {
        self.save(BreakerState::closed()).await;
        metrics::record_state(&self.name, BreakerStatus::Closed);
        tracing::info!(breaker = %self.name, "Circuit breaker reset");
    }

    async fn load(&self) -> BreakerState {
        match self.store.get(&self.store_key).await {
            Ok(found) => {
                let state = found.unwrap_or_default();
                *self.local_copy() = state;
                state
            }
            Err(e) => {
                tracing::warn!(
                    breaker = %self.name,
                    store = self.store.kind(),
                    error = %e,
                    "State store read failed, using local copy"
                );
                metrics::record_store_fallback("get");
                let state = *self.local_copy();
                state
            }
        }
    }

    async fn save(&self, state: BreakerState) {
        *self.local_copy() = state;
        if let Err(e) = self.store.set(&self.store_key, &state).await {
            tracing::warn!(
                breaker = %self.name,
                store = self.store.kind(),
                error = %e,
                "State store write failed, keeping local copy"
            );
            metrics::record_store_fallback("set");
        }
    }

    fn local_copy(&self) -> MutexGuard<'_, BreakerState> {
        self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_transition(&self, from: BreakerStatus, to: BreakerStatus) {
        tracing::info!(breaker = %self.name, from = %from, to = %to, "Circuit breaker state changed");
        metrics::record_transition(&self.name, from, to);
    }
}
