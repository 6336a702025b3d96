//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tally_db::DbConfig;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// How long a writer waits for the SQLite write lock, in milliseconds
    pub busy_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_port: 8080,
            database_path: "./tally.db".to_string(),
            max_connections: 8,
            busy_timeout_ms: 5000,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the environment in `load`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            http_port: parse_or(&lookup, "TALLY_HTTP_PORT", defaults.http_port)?,
            database_path: lookup("TALLY_DB_PATH").unwrap_or(defaults.database_path),
            max_connections: parse_or(
                &lookup,
                "TALLY_DB_MAX_CONNECTIONS",
                defaults.max_connections,
            )?,
            busy_timeout_ms: parse_or(
                &lookup,
                "TALLY_DB_BUSY_TIMEOUT_MS",
                defaults.busy_timeout_ms,
            )?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "TALLY_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    /// Storage settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.database_path, "./tally.db");
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("TALLY_HTTP_PORT", "9000"),
            ("TALLY_DB_PATH", "/var/lib/tally/tally.db"),
            ("TALLY_DB_BUSY_TIMEOUT_MS", " 250 "),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.database_path, "/var/lib/tally/tally.db");
        assert_eq!(config.busy_timeout_ms, 250);
    }

    #[test]
    fn test_invalid_values() {
        let err = ApiConfig::from_lookup(lookup(&[("TALLY_HTTP_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key) if key == "TALLY_HTTP_PORT"));

        let err =
            ApiConfig::from_lookup(lookup(&[("TALLY_DB_MAX_CONNECTIONS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
