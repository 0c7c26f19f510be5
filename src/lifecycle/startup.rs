//! Startup orchestration.
//!
//! # Responsibilities
//! - Select the state store from configuration
//! - Build the registry with configured category profiles
//! - Pre-register declared dependencies

use std::sync::Arc;

use crate::config::BreakerServiceConfig;
use crate::resilience::{BreakerProfiles, CircuitBreakerRegistry};
use crate::store::build_store;

/// Build the breaker registry described by `config`.
pub fn build_registry(config: &BreakerServiceConfig) -> Arc<CircuitBreakerRegistry> {
    let store = build_store(&config.store);
    let registry = CircuitBreakerRegistry::new(store)
        .with_profiles(BreakerProfiles::from(&config.profiles))
        .with_key_prefix(config.store.key_prefix.clone());

    for dep in &config.dependencies {
        registry.get_or_create(dep.category, &dep.name);
    }

    tracing::info!(
        store = registry.store_kind(),
        breakers = registry.len(),
        "Circuit breaker registry ready"
    );
    Arc::new(registry)
}
