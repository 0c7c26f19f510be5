//! Breaker registry.
//!
//! # Responsibilities
//! - Hand out one breaker per logical dependency (`db:<name>`, `api:<name>`)
//! - Apply category thresholds on first use
//! - Enumerate known breakers for the admin API
//!
//! The registry is an ordinary value built at startup and shared through
//! `Arc`; there is no process-wide global.

use std::fmt;
use std::sync::Arc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::resilience::circuit_breaker::{CircuitBreaker, DEFAULT_KEY_PREFIX};
use crate::resilience::clock::{Clock, SystemClock};
use crate::resilience::state::BreakerConfig;
use crate::store::StateStore;

/// Kind of dependency a breaker protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerCategory {
    Database,
    ExternalApi,
}

impl BreakerCategory {
    /// Key prefix for breakers of this category.
    pub fn prefix(&self) -> &'static str {
        match self {
            BreakerCategory::Database => "db",
            BreakerCategory::ExternalApi => "api",
        }
    }

    pub fn key(&self, name: &str) -> String {
        format!("{}:{}", self.prefix(), name)
    }
}

impl fmt::Display for BreakerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Thresholds applied per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerProfiles {
    pub database: BreakerConfig,
    pub external_api: BreakerConfig,
}

impl Default for BreakerProfiles {
    fn default() -> Self {
        Self {
            database: BreakerConfig::database(),
            external_api: BreakerConfig::external_api(),
        }
    }
}

impl BreakerProfiles {
    pub fn for_category(&self, category: BreakerCategory) -> BreakerConfig {
        match category {
            BreakerCategory::Database => self.database,
            BreakerCategory::ExternalApi => self.external_api,
        }
    }
}

/// Singleton-per-key breaker factory.
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    profiles: BreakerProfiles,
    key_prefix: String,
}

impl CircuitBreakerRegistry {
    /// Create an empty registry over `store` with default profiles.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            breakers: DashMap::new(),
            store,
            clock: Arc::new(SystemClock),
            profiles: BreakerProfiles::default(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    pub fn with_profiles(mut self, profiles: BreakerProfiles) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Breaker for a database dependency, keyed `db:<name>`.
    pub fn for_database(&self, name: &str) -> Arc<CircuitBreaker> {
        self.get_or_create(BreakerCategory::Database, name)
    }

    /// Breaker for a third-party API, keyed `api:<name>`.
    pub fn for_external_api(&self, name: &str) -> Arc<CircuitBreaker> {
        self.get_or_create(BreakerCategory::ExternalApi, name)
    }

    /// Return the breaker for `category:name`, creating it on first use.
    pub fn get_or_create(&self, category: BreakerCategory, name: &str) -> Arc<CircuitBreaker> {
        let key = category.key(name);
        if let Some(existing) = self.breakers.get(&key) {
            return existing.value().clone();
        }

        let config = self.profiles.for_category(category);
        self.breakers
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::debug!(
                    breaker = %key,
                    failure_threshold = config.failure_threshold,
                    reset_timeout_ms = config.reset_timeout_ms(),
                    "Registering circuit breaker"
                );
                Arc::new(
                    CircuitBreaker::new(key.clone(), config, self.store.clone())
                        .with_clock(self.clock.clone())
                        .with_key_prefix(&self.key_prefix),
                )
            })
            .value()
            .clone()
    }

    /// Look up an already registered breaker by its full key.
    pub fn get(&self, key: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(key).map(|r| r.value().clone())
    }

    /// All registered breakers, ordered by key.
    pub fn breakers(&self) -> Vec<Arc<CircuitBreaker>> {
        let mut all: Vec<_> = self.breakers.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Label of the backing store (`remote` or `memory`).
    pub fn store_kind(&self) -> &'static str {
        self.store.kind()
    }
}

impl fmt::Debug for CircuitBreakerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreakerRegistry")
            .field("breakers", &self.breakers.len())
            .field("store", &self.store.kind())
            .field("profiles", &self.profiles)
            .finish()
    }
}
