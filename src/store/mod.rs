//! Shared breaker state storage.
//!
//! # Data Flow
//! ```text
//! CircuitBreaker
//!     → StateStore::get / set (key = "cb:<breaker name>")
//!         → remote.rs (Redis REST endpoint shared by all instances)
//!         → memory.rs (process-local map, no coordination)
//!     → on StoreError: breaker keeps its own local copy
//! ```
//!
//! # Design Decisions
//! - Last write wins; there is no compare-and-set
//! - The variant is chosen once at startup, never per call
//! - Store errors are for logs and metrics only, callers never see them

pub mod memory;
pub mod remote;

use std::sync::Arc;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::StoreConfig;
use crate::resilience::state::BreakerState;

pub use memory::InMemoryStore;
pub use remote::RemoteStore;

/// Errors raised by a state store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport failure, including timeouts.
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Store answered with a non-success HTTP status.
    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Store accepted the request but reported a command error.
    #[error("store command error: {0}")]
    Remote(String),

    /// Stored value is not a valid breaker record.
    #[error("invalid breaker record: {0}")]
    Decode(#[from] serde_json::Error),

    /// Store could not be constructed from configuration.
    #[error("store misconfigured: {0}")]
    Config(String),
}

/// Key-value contract the breaker depends on.
#[async_trait]
pub trait StateStore: Send + Sync + std::fmt::Debug {
    /// Fetch a record. `Ok(None)` means the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<BreakerState>, StoreError>;

    /// Overwrite a record.
    async fn set(&self, key: &str, state: &BreakerState) -> Result<(), StoreError>;

    /// Short label for logs and the admin status page.
    fn kind(&self) -> &'static str;
}

/// Build the configured store.
///
/// Uses the remote store when both URL and token are present and the client
/// can be built, otherwise the in-memory store.
pub fn build_store(config: &StoreConfig) -> Arc<dyn StateStore> {
    match (&config.rest_url, &config.rest_token) {
        (Some(url), Some(token)) => match RemoteStore::new(url, token, config.timeout()) {
            Ok(store) => {
                tracing::info!(url = %url, timeout_ms = config.timeout_ms, "Using remote breaker state store");
                Arc::new(store)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not initialize remote state store. Falling back to memory.");
                Arc::new(InMemoryStore::new())
            }
        },
        _ => {
            tracing::info!("No remote state store configured, breaker state is process-local");
            Arc::new(InMemoryStore::new())
        }
    }
}
