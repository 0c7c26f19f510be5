//! Distributed circuit breaker.
//!
//! Guards database queries and third-party API calls with a
//! CLOSED → OPEN → HALF_OPEN state machine whose state lives in a shared
//! store, so every stateless application instance trips and recovers the
//! same logical circuit.
//!
//! ```no_run
//! use std::sync::Arc;
//! use shared_breaker::resilience::{BreakerOpenError, CircuitBreakerRegistry};
//! use shared_breaker::store::InMemoryStore;
//!
//! #[derive(Debug, thiserror::Error)]
//! enum RepoError {
//!     #[error(transparent)]
//!     Unavailable(#[from] BreakerOpenError),
//!     #[error("query failed: {0}")]
//!     Query(String),
//! }
//!
//! # async fn run() -> Result<(), RepoError> {
//! let registry = CircuitBreakerRegistry::new(Arc::new(InMemoryStore::new()));
//! let contacts = registry.for_database("contacts-db");
//! let rows: Vec<String> = contacts
//!     .execute(|| async { Ok::<_, RepoError>(vec!["alice".to_string()]) })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod store;

pub use config::schema::BreakerServiceConfig;
pub use lifecycle::Shutdown;
pub use resilience::{BreakerOpenError, BreakerStatus, CircuitBreaker, CircuitBreakerRegistry};
