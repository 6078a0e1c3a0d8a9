//! # Ensemble Config
//!
//! Single-file YAML configuration for an agent host: the service's public
//! identity and listen address, plus broker connection settings.

mod loader;

pub use loader::{load_config, ConfigError, ENV_BASE_URL, ENV_BROKER_URL, ENV_LISTEN};

use serde::Deserialize;

/// Top-level configuration schema for an agent host.
#[derive(Debug, Clone, Deserialize)]
pub struct EnsembleConfig {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            service: ServiceConfig::default(),
            broker: BrokerConfig::default(),
        }
    }
}

/// The host's own identity and bind address.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Public base URL the broker uses to reach this host. Required before
    /// any catalog registration; may stay empty for unregistered local runs.
    #[serde(default)]
    pub base_url: String,
    /// Optional path prefix all agent routes mount under.
    #[serde(default)]
    pub base_path: Option<String>,
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            base_url: String::new(),
            base_path: None,
            listen: default_listen(),
        }
    }
}

fn default_service_name() -> String {
    "ensemble".to_string()
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

/// Broker connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_broker_url")]
    pub url: String,
    #[serde(default = "default_broker_timeout")]
    pub timeout_secs: u64,
    /// Environment variable holding the bearer token for task submission.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: default_broker_url(),
            timeout_secs: default_broker_timeout(),
            token_env: default_token_env(),
        }
    }
}

impl BrokerConfig {
    /// Resolve the bearer token from the configured environment variable.
    pub fn resolve_token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

fn default_broker_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_broker_timeout() -> u64 {
    30
}

fn default_token_env() -> String {
    "ENSEMBLE_BROKER_TOKEN".to_string()
}
