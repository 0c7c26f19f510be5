//! Resilience error types.

use thiserror::Error;

/// Returned by `CircuitBreaker::execute` when the call was short-circuited.
///
/// The protected operation was not attempted. Callers should treat the
/// dependency as degraded and avoid retrying aggressively.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Circuit breaker '{name}' is OPEN.")]
pub struct BreakerOpenError {
    name: String,
}

impl BreakerOpenError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Name of the breaker that rejected the call, e.g. `db:contacts-db`.
    pub fn breaker(&self) -> &str {
        &self.name
    }
}
