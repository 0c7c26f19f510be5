//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every field has a default so an empty file is a valid configuration.

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::resilience::circuit_breaker::DEFAULT_KEY_PREFIX;
use crate::resilience::registry::{BreakerCategory, BreakerProfiles};
use crate::resilience::state::BreakerConfig;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BreakerServiceConfig {
    /// Shared state store.
    pub store: StoreConfig,

    /// Thresholds per breaker category.
    pub profiles: ProfilesConfig,

    /// Breakers registered at startup so the admin API can report them.
    pub dependencies: Vec<DependencyConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// State store configuration.
///
/// When both `rest_url` and `rest_token` are set the breaker state is shared
/// through the remote store; otherwise it stays in process memory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Redis REST endpoint (e.g., "https://eu1-example.upstash.io").
    pub rest_url: Option<String>,

    /// Bearer token for the REST endpoint.
    pub rest_token: Option<String>,

    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Prefix for store keys ("cb" gives "cb:db:contacts-db").
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            rest_url: None,
            rest_token: None,
            timeout_ms: 1000,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn is_remote(&self) -> bool {
        self.rest_url.is_some() && self.rest_token.is_some()
    }
}

/// Thresholds for one breaker category.
///
/// Unset fields fall back to the category's built-in profile, so a table
/// may override just one of them.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProfileConfig {
    /// Failures before the circuit opens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<u32>,

    /// Cool-down before a probe is allowed, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_timeout_ms: Option<u64>,
}

impl ProfileConfig {
    /// Overlay the configured fields on `fallback`.
    pub fn resolve(&self, fallback: BreakerConfig) -> BreakerConfig {
        BreakerConfig::new(
            self.failure_threshold.unwrap_or(fallback.failure_threshold),
            self.reset_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(fallback.reset_timeout),
        )
    }
}

/// Category profiles.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfilesConfig {
    pub database: ProfileConfig,
    pub external_api: ProfileConfig,
}

impl From<&ProfilesConfig> for BreakerProfiles {
    fn from(config: &ProfilesConfig) -> Self {
        Self {
            database: config.database.resolve(BreakerConfig::database()),
            external_api: config.external_api.resolve(BreakerConfig::external_api()),
        }
    }
}

/// A protected dependency known at startup.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DependencyConfig {
    pub category: BreakerCategory,
    pub name: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
