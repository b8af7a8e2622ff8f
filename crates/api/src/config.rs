//! Process configuration for the API binary.

use std::net::SocketAddr;

use thiserror::Error;

use coursedesk_infra::config::{ConfigError, StoreConfig, parse_switch};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error)]
pub enum ApiConfigError {
    #[error("invalid BIND_ADDR '{0}'")]
    BindAddr(String),

    #[error(transparent)]
    Store(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
    /// Seed the platform menu and demo accounts at startup (dev only).
    pub seed_demo: bool,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ApiConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse()
            .map_err(|_| ApiConfigError::BindAddr(raw_addr.clone()))?;

        let seed_demo = match lookup("SEED_DEMO") {
            Some(raw) => parse_switch("SEED_DEMO", &raw)?,
            None => false,
        };

        Ok(Self {
            bind_addr,
            store: StoreConfig::from_lookup(&lookup)?,
            seed_demo,
        })
    }
}
