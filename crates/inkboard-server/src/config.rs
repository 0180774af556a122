//! Server configuration from the environment.

use std::net::SocketAddr;
use thiserror::Error;

pub const ADDR_VAR: &str = "INKBOARD_ADDR";
pub const DEFAULT_ADDR: &str = "0.0.0.0:3030";

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "inkboard_server=info,tower_http=info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("INKBOARD_ADDR={value} is not a socket address: {source}")]
    InvalidAddr {
        value: String,
        source: std::net::AddrParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = lookup(ADDR_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = value
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidAddr { value: value.clone(), source })?;
        Ok(Self { addr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_addr() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.addr.port(), 3030);
    }

    #[test]
    fn test_override_and_invalid() {
        let config = ServerConfig::from_lookup(|_| Some("127.0.0.1:8080".to_string())).unwrap();
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert!(ServerConfig::from_lookup(|_| Some("localhost".to_string())).is_err());
    }
}
