//! Breaker state record and configuration.
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: now >= next_attempt_at (observed by execute)
//! Half-Open → Closed: probe succeeds
//! Half-Open → Open: probe fails
//! ```
//!
//! The record is serialized exactly as other instances write it to the shared
//! store: camelCase keys and upper-case status names.

use std::fmt;
use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Logical breaker status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerStatus {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerStatus::Closed => "CLOSED",
            BreakerStatus::Open => "OPEN",
            BreakerStatus::HalfOpen => "HALF_OPEN",
        }
    }

    /// Gauge value used by the metrics exporter.
    pub fn gauge_value(&self) -> f64 {
        match self {
            BreakerStatus::Closed => 0.0,
            BreakerStatus::HalfOpen => 1.0,
            BreakerStatus::Open => 2.0,
        }
    }
}

impl fmt::Display for BreakerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted state of one breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerState {
    #[serde(rename = "state")]
    pub status: BreakerStatus,
    #[serde(default)]
    pub failure_count: u32,
    /// Epoch milliseconds. Only meaningful while `status` is `Open`.
    #[serde(rename = "nextAttempt", default)]
    pub next_attempt_at: u64,
}

impl Default for BreakerState {
    fn default() -> Self {
        Self::closed()
    }
}

impl BreakerState {
    /// The reset record: closed, no failures, no scheduled attempt.
    pub const fn closed() -> Self {
        Self {
            status: BreakerStatus::Closed,
            failure_count: 0,
            next_attempt_at: 0,
        }
    }

    /// Status as seen by callers at `now_ms`.
    ///
    /// An open record whose cool-down has elapsed reads as half-open even
    /// though the stored record still says open. Both `execute` and `state`
    /// decide through this function.
    pub fn effective_status(&self, now_ms: u64) -> BreakerStatus {
        match self.status {
            BreakerStatus::Open if now_ms >= self.next_attempt_at => BreakerStatus::HalfOpen,
            status => status,
        }
    }

    /// Record after a successful call.
    pub fn on_success(&self) -> Self {
        Self::closed()
    }

    /// Record after a failed call observed at `now_ms`.
    pub fn on_failure(&self, config: &BreakerConfig, now_ms: u64) -> Self {
        let reopen_at = now_ms.saturating_add(config.reset_timeout_ms());

        if self.status == BreakerStatus::HalfOpen {
            return Self {
                status: BreakerStatus::Open,
                failure_count: config.failure_threshold,
                next_attempt_at: reopen_at,
            };
        }

        let failure_count = self.failure_count.saturating_add(1);
        if failure_count >= config.failure_threshold {
            Self {
                status: BreakerStatus::Open,
                failure_count,
                next_attempt_at: reopen_at,
            }
        } else {
            Self {
                status: self.status,
                failure_count,
                next_attempt_at: self.next_attempt_at,
            }
        }
    }

    /// Whether a success observed with this prior state needs a write.
    pub fn needs_reset_on_success(&self) -> bool {
        self.status == BreakerStatus::HalfOpen || self.failure_count > 0
    }
}

/// Thresholds fixed for the lifetime of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Failures needed to trip from closed to open. At least 1.
    pub failure_threshold: u32,
    /// Cool-down before a probe is allowed.
    pub reset_timeout: Duration,
}

impl BreakerConfig {
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
        }
    }

    /// Defaults for database dependencies: trips fast, recovers quickly.
    pub fn database() -> Self {
        Self::new(5, Duration::from_secs(30))
    }

    /// Defaults for third-party APIs: more tolerant, longer cool-down.
    pub fn external_api() -> Self {
        Self::new(10, Duration::from_secs(60))
    }

    pub fn reset_timeout_ms(&self) -> u64 {
        u64::try_from(self.reset_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}
