//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breakers, store, admin API produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for log aggregation)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - State transitions at info, rejections at debug, store fallbacks at warn
//! - Metrics are cheap no-ops until the exporter is installed

pub mod logging;
pub mod metrics;
