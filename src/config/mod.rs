//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, overlay UPSTASH_* env vars)
//!     → validation.rs (semantic checks)
//!     → BreakerServiceConfig (validated, immutable)
//!     → store selection, registry profiles, admin API
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; breaker thresholds never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::BreakerServiceConfig;
pub use schema::StoreConfig;
pub use schema::ObservabilityConfig;
pub use schema::AdminConfig;
