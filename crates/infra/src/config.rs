//! Store configuration loaded from the environment.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres { url: String, max_connections: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub grant_cache: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::InMemory,
            grant_cache: true,
        }
    }
}

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

impl StoreConfig {
    /// Reads `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS` and `GRANT_CACHE`.
    ///
    /// `GRANT_CACHE` defaults to on for the in-memory store and off for
    /// Postgres.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            None => StoreBackend::InMemory,
            Some(url) => {
                let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
                    None => DEFAULT_MAX_CONNECTIONS,
                    Some(raw) => match raw.trim().parse::<u32>() {
                        Ok(n) if n > 0 => n,
                        _ => {
                            return Err(ConfigError::Invalid {
                                key: "DATABASE_MAX_CONNECTIONS",
                                value: raw,
                                reason: "expected a positive integer",
                            });
                        }
                    },
                };
                StoreBackend::Postgres {
                    url,
                    max_connections,
                }
            }
        };

        // The cache only sees writes made through this process. A shared
        // database may have other grant writers, so it is opt-in there.
        let grant_cache = match lookup("GRANT_CACHE") {
            Some(raw) => parse_switch("GRANT_CACHE", &raw)?,
            None => matches!(backend, StoreBackend::InMemory),
        };

        Ok(Self {
            backend,
            grant_cache,
        })
    }
}

/// Parse an on/off style switch.
pub fn parse_switch(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected on/off",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<StoreConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StoreConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_cached_in_memory() {
        assert_eq!(load(&[]).unwrap(), StoreConfig::default());
    }

    #[test]
    fn database_url_selects_postgres() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/coursedesk"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("GRANT_CACHE", "off"),
        ])
        .unwrap();
        assert_eq!(
            config.backend,
            StoreBackend::Postgres {
                url: "postgres://localhost/coursedesk".to_string(),
                max_connections: 4,
            }
        );
        assert!(!config.grant_cache);
    }

    #[test]
    fn postgres_leaves_the_grant_cache_off_unless_asked() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/coursedesk")]).unwrap();
        assert!(!config.grant_cache);

        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/coursedesk"),
            ("GRANT_CACHE", "on"),
        ])
        .unwrap();
        assert!(config.grant_cache);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(load(&[("GRANT_CACHE", "maybe")]).is_err());
        assert!(
            load(&[
                ("DATABASE_URL", "postgres://x"),
                ("DATABASE_MAX_CONNECTIONS", "0"),
            ])
            .is_err()
        );
    }
}
