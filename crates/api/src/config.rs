//! Process configuration, read from the environment at startup.

use std::net::SocketAddr;

use thiserror::Error;

/// Environment variable holding the listen address.
pub const BIND_ADDR_VAR: &str = "PETSTORE_BIND_ADDR";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value:?}")]
    InvalidBindAddr { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup (lets tests avoid touching the
    /// process environment).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw = lookup(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw.parse().map_err(|_| ConfigError::InvalidBindAddr {
            var: BIND_ADDR_VAR,
            value: raw.clone(),
        })?;
        Ok(Self { bind_addr })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}
