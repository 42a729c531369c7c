//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{Backend, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overrides, then
/// validation.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Apply the environment variables the service has always honored.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("HOST") {
        config.listener.host = host;
    }
    if let Some(port) = lookup("PORT") {
        config.listener.port = port.trim().parse().map_err(|_| ConfigError::Env {
            var: "PORT",
            value: port.clone(),
        })?;
    }
    if let Some(hosts) = lookup("ZK_HOSTS") {
        config.zookeeper.hosts = hosts;
    }
    if let Some(timeout) = lookup("ZK_TIMEOUT") {
        config.zookeeper.timeout_secs = timeout.trim().parse().map_err(|_| ConfigError::Env {
            var: "ZK_TIMEOUT",
            value: timeout.clone(),
        })?;
    }
    if let Some(read_only) = lookup("ZK_READ_ONLY") {
        config.zookeeper.read_only = parse_flag(&read_only);
    }
    if let Some(backend) = lookup("ZK_BACKEND") {
        config.zookeeper.backend = match backend.trim().to_ascii_lowercase().as_str() {
            "zookeeper" => Backend::ZooKeeper,
            "memory" => Backend::Memory,
            _ => {
                return Err(ConfigError::Env {
                    var: "ZK_BACKEND",
                    value: backend,
                })
            }
        };
    }
    if let Some(enabled) = lookup("API_KEY_ENABLED") {
        config.security.api_key_enabled = parse_flag(&enabled);
    }
    if let Some(key) = lookup("API_KEY") {
        config.security.api_key = key;
    }
    if let Some(origins) = lookup("CORS_ORIGINS") {
        config.cors.allowed_origins = origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    Ok(())
}
