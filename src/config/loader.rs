//! Configuration loading from disk and environment.

use std::path::Path;
use std::fs;
use crate::config::schema::BreakerServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the Redis REST endpoint.
pub const ENV_REST_URL: &str = "UPSTASH_REDIS_REST_URL";
/// Environment variable holding the Redis REST token.
pub const ENV_REST_TOKEN: &str = "UPSTASH_REDIS_REST_TOKEN";
/// Environment variable overriding the configured log level.
pub const ENV_LOG_LEVEL: &str = "BREAKER_LOG_LEVEL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load, apply environment overrides, and validate a TOML file.
pub fn load_config(path: &Path) -> Result<BreakerServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Configuration from environment variables alone.
pub fn load_from_env() -> Result<BreakerServiceConfig, ConfigError> {
    parse_config("", |key| std::env::var(key).ok())
}

/// Parse `content`, overlay variables from `env`, then validate.
pub fn parse_config<F>(content: &str, env: F) -> Result<BreakerServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: BreakerServiceConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    apply_env_overrides(&mut config, env);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn apply_env_overrides<F>(config: &mut BreakerServiceConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = non_empty(ENV_REST_URL) {
        config.store.rest_url = Some(url);
    }
    if let Some(token) = non_empty(ENV_REST_TOKEN) {
        config.store.rest_token = Some(token);
    }
    if let Some(level) = non_empty(ENV_LOG_LEVEL) {
        config.observability.log_level = level;
    }
}
