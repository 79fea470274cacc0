//! Configuration loading and representation.
//!
//! Read from the process environment:
//!
//! - `USE_PERSISTENT_STORES`: `true` selects Postgres, anything parsed as `false`
//!   (or unset) selects the in-memory store
//! - `DATABASE_URL`: required when persistent stores are enabled
//! - `DATABASE_MAX_CONNECTIONS`: optional pool size (default 5)

use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")]
    MissingDatabaseUrl,

    #[error("invalid value `{value}` for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Which warehouse store backs the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::InMemory,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let use_persistent = match lookup("USE_PERSISTENT_STORES") {
            None => false,
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                key: "USE_PERSISTENT_STORES",
                value: raw,
            })?,
        };

        if !use_persistent {
            return Ok(Self::default());
        }

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "DATABASE_MAX_CONNECTIONS",
                        value: raw,
                    });
                }
            },
        };

        Ok(Self {
            backend: StoreBackend::Postgres {
                database_url,
                max_connections,
            },
        })
    }
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_in_memory() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend, StoreBackend::InMemory);
    }

    #[test]
    fn persistent_requires_database_url() {
        let err = StoreConfig::from_lookup(lookup(&[("USE_PERSISTENT_STORES", "true")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingDatabaseUrl);
    }

    #[test]
    fn persistent_with_url_selects_postgres() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/fulfilment"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();

        assert_eq!(
            config.backend,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/fulfilment".to_string(),
                max_connections: 12,
            }
        );
    }

    #[test]
    fn garbage_flag_is_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[("USE_PERSISTENT_STORES", "yes please")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "USE_PERSISTENT_STORES", .. }));
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/fulfilment"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "DATABASE_MAX_CONNECTIONS", .. }));
    }
}
