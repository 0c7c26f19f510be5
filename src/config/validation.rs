//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds >= 1, timeouts > 0)
//! - Check the remote store is fully configured or not at all
//! - Detect duplicate dependency declarations
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: config → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::BreakerServiceConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("profiles.{profile}.failure_threshold must be at least 1")]
    ZeroThreshold { profile: &'static str },

    #[error("store.timeout_ms must be greater than 0")]
    ZeroStoreTimeout,

    #[error("store.rest_url and store.rest_token must be set together")]
    PartialStoreCredentials,

    #[error("store.rest_url is not a valid http(s) URL: {0}")]
    InvalidStoreUrl(String),

    #[error("store.key_prefix must not be empty")]
    EmptyKeyPrefix,

    #[error("dependency name must not be empty")]
    EmptyDependencyName,

    #[error("dependency '{0}' is declared more than once")]
    DuplicateDependency(String),

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Check a parsed configuration.
pub fn validate_config(config: &BreakerServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.profiles.database.failure_threshold == Some(0) {
        errors.push(ValidationError::ZeroThreshold { profile: "database" });
    }
    if config.profiles.external_api.failure_threshold == Some(0) {
        errors.push(ValidationError::ZeroThreshold { profile: "external_api" });
    }

    let store = &config.store;
    if store.timeout_ms == 0 {
        errors.push(ValidationError::ZeroStoreTimeout);
    }
    if store.rest_url.is_some() != store.rest_token.is_some() {
        errors.push(ValidationError::PartialStoreCredentials);
    }
    if let Some(raw) = &store.rest_url {
        match url::Url::parse(raw) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            _ => errors.push(ValidationError::InvalidStoreUrl(raw.clone())),
        }
    }
    if store.key_prefix.is_empty() {
        errors.push(ValidationError::EmptyKeyPrefix);
    }

    let mut seen = HashSet::new();
    for dep in &config.dependencies {
        if dep.name.trim().is_empty() {
            errors.push(ValidationError::EmptyDependencyName);
            continue;
        }
        let key = dep.category.key(&dep.name);
        if !seen.insert(key.clone()) {
            errors.push(ValidationError::DuplicateDependency(key));
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
