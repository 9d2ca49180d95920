//! services/memo_web/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// JSON file mapping provider credentials to accounts.
    pub identity_accounts_path: PathBuf,
    pub allowed_origin: String,
    /// Buffer size of the in-memory store's change notifications.
    pub snapshot_channel_capacity: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Server Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin =
            lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Adapter Settings ---
        let identity_accounts_path = lookup("IDENTITY_ACCOUNTS_PATH")
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingVar("IDENTITY_ACCOUNTS_PATH".to_string()))?;

        let snapshot_channel_capacity = match lookup("SNAPSHOT_CHANNEL_CAPACITY") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|capacity| *capacity > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "SNAPSHOT_CHANNEL_CAPACITY".to_string(),
                        format!("'{}' is not a positive integer", raw),
                    )
                })?,
            None => 256,
        };

        Ok(Self {
            bind_address,
            log_level,
            identity_accounts_path,
            allowed_origin,
            snapshot_channel_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config = load(&[("IDENTITY_ACCOUNTS_PATH", "/etc/memo/accounts.json")]).unwrap();
        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.allowed_origin, "http://localhost:3000");
        assert_eq!(config.snapshot_channel_capacity, 256);
    }

    #[test]
    fn accounts_path_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(var) if var == "IDENTITY_ACCOUNTS_PATH"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = load(&[
            ("IDENTITY_ACCOUNTS_PATH", "/tmp/a.json"),
            ("BIND_ADDRESS", "not-an-address"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "BIND_ADDRESS"));

        let err = load(&[
            ("IDENTITY_ACCOUNTS_PATH", "/tmp/a.json"),
            ("SNAPSHOT_CHANNEL_CAPACITY", "0"),
        ])
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue(var, _) if var == "SNAPSHOT_CHANNEL_CAPACITY")
        );
    }
}
