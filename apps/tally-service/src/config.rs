//! Service configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                   | Default    |
//! |----------------------------|------------|
//! | `TALLY_DATABASE_PATH`      | `tally.db` |
//! | `TALLY_DB_MAX_CONNECTIONS` | `5`        |
//! | `TALLY_DB_BUSY_TIMEOUT_MS` | `5000`     |
//! | `TALLY_SALE_TIMEOUT_MS`    | `10000`    |
//! | `TALLY_RECENT_SALES_LIMIT` | `5`        |
//! | `TALLY_LOG`                | `info`     |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tally_db::DbConfig;

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// How long a sale waits for another sale's write lock, in milliseconds
    pub db_busy_timeout_ms: u64,

    /// Upper bound on one whole sale, in milliseconds. On expiry the sale
    /// is rolled back.
    pub sale_timeout_ms: u64,

    /// Number of sales listed in the summary
    pub recent_sales_limit: u32,

    /// tracing-subscriber filter directive
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            database_path: PathBuf::from("tally.db"),
            db_max_connections: 5,
            db_busy_timeout_ms: 5_000,
            sale_timeout_ms: 10_000,
            recent_sales_limit: 5,
            log_filter: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServiceConfig::default();

        let config = ServiceConfig {
            database_path: lookup("TALLY_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            db_max_connections: parse_or(&lookup, "TALLY_DB_MAX_CONNECTIONS", defaults.db_max_connections)?,

            db_busy_timeout_ms: parse_or(&lookup, "TALLY_DB_BUSY_TIMEOUT_MS", defaults.db_busy_timeout_ms)?,

            sale_timeout_ms: parse_or(&lookup, "TALLY_SALE_TIMEOUT_MS", defaults.sale_timeout_ms)?,

            recent_sales_limit: parse_or(&lookup, "TALLY_RECENT_SALES_LIMIT", defaults.recent_sales_limit)?,

            log_filter: lookup("TALLY_LOG").unwrap_or(defaults.log_filter),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("TALLY_DB_MAX_CONNECTIONS".to_string()));
        }
        if config.sale_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("TALLY_SALE_TIMEOUT_MS".to_string()));
        }

        Ok(config)
    }

    pub fn sale_timeout(&self) -> Duration {
        Duration::from_millis(self.sale_timeout_ms)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .busy_timeout(Duration::from_millis(self.db_busy_timeout_ms))
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

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.database_path, PathBuf::from("tally.db"));
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.sale_timeout(), Duration::from_secs(10));
        assert_eq!(config.recent_sales_limit, 5);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("TALLY_DATABASE_PATH", "/var/lib/tally/shop.db"),
            ("TALLY_DB_BUSY_TIMEOUT_MS", "250"),
            ("TALLY_RECENT_SALES_LIMIT", "10"),
            ("TALLY_LOG", "tally_db=debug"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/tally/shop.db"));
        assert_eq!(config.recent_sales_limit, 10);
        assert_eq!(config.log_filter, "tally_db=debug");

        let db = config.db_config();
        assert_eq!(db.busy_timeout, Duration::from_millis(250));
        assert_eq!(db.max_connections, 5);
    }

    #[test]
    fn test_invalid_values() {
        let err = ServiceConfig::from_lookup(lookup_from(&[("TALLY_SALE_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for TALLY_SALE_TIMEOUT_MS");

        assert!(ServiceConfig::from_lookup(lookup_from(&[("TALLY_DB_MAX_CONNECTIONS", "0")])).is_err());
    }
}
