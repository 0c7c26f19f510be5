//! Process-local state store.

use std::sync::Arc;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::resilience::state::BreakerState;
use crate::store::{StateStore, StoreError};

/// A thread-safe map of breaker records. Never fails.
///
/// Clones share the same map, so every breaker built from one registry sees
/// the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<DashMap<String, BreakerState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<BreakerState>, StoreError> {
        Ok(self.inner.get(key).map(|r| *r.value()))
    }

    async fn set(&self, key: &str, state: &BreakerState) -> Result<(), StoreError> {
        self.inner.insert(key.to_string(), *state);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
