//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Operation wrapper (database query, third-party call):
//!     → registry.rs (one breaker per "db:<name>" / "api:<name>")
//!     → circuit_breaker.rs (read shared state, fast-fail or call)
//!     → state.rs (derive effective status, apply outcome)
//!     → store (persist new state, local copy on store failure)
//! ```
//!
//! # Design Decisions
//! - Breaker state is shared across instances through the state store
//! - The protected call's own errors are returned unchanged
//! - Only short-circuited calls produce `BreakerOpenError`
//! - No retries or timeouts here; callers layer those on top

pub mod circuit_breaker;
pub mod clock;
pub mod error;
pub mod registry;
pub mod state;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::BreakerOpenError;
pub use registry::{BreakerCategory, BreakerProfiles, CircuitBreakerRegistry};
pub use state::{BreakerConfig, BreakerState, BreakerStatus};
