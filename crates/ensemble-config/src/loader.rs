//! Configuration loading and validation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::EnsembleConfig;

/// Overrides `broker.url` when set.
pub const ENV_BROKER_URL: &str = "ENSEMBLE_BROKER_URL";
/// Overrides `service.base_url` when set.
pub const ENV_BASE_URL: &str = "ENSEMBLE_BASE_URL";
/// Overrides `service.listen` when set.
pub const ENV_LISTEN: &str = "ENSEMBLE_LISTEN";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load host configuration from a YAML file.
///
/// Environment overrides (`ENSEMBLE_BROKER_URL`, `ENSEMBLE_BASE_URL`,
/// `ENSEMBLE_LISTEN`) apply after the file is parsed and before validation.
pub fn load_config(path: &Path) -> Result<EnsembleConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: EnsembleConfig = serde_yaml::from_str(&content)?;
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut EnsembleConfig) {
    if let Some(url) = non_empty_env(ENV_BROKER_URL) {
        tracing::debug!(var = ENV_BROKER_URL, "applying broker url override");
        config.broker.url = url;
    }
    if let Some(base_url) = non_empty_env(ENV_BASE_URL) {
        tracing::debug!(var = ENV_BASE_URL, "applying base url override");
        config.service.base_url = base_url;
    }
    if let Some(listen) = non_empty_env(ENV_LISTEN) {
        tracing::debug!(var = ENV_LISTEN, "applying listen override");
        config.service.listen = listen;
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn validate_config(config: &EnsembleConfig) -> Result<(), ConfigError> {
    if config.version == 0 {
        return Err(ConfigError::Invalid(
            "version must be greater than 0".to_string(),
        ));
    }

    if config.service.name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "service.name must not be empty".to_string(),
        ));
    }

    if config.service.listen.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "service.listen must not be empty".to_string(),
        ));
    }

    if let Some(base_path) = &config.service.base_path {
        if !base_path.starts_with('/') {
            return Err(ConfigError::Invalid(
                "service.base_path must start with '/'".to_string(),
            ));
        }
    }

    if config.broker.url.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "broker.url must not be empty".to_string(),
        ));
    }

    if config.broker.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "broker.timeout_secs must be > 0".to_string(),
        ));
    }

    Ok(())
}
