//! Client endpoints.

use thiserror::Error;
use url::Url;

pub const API_URL_VAR: &str = "INKBOARD_API_URL";
pub const WS_URL_VAR: &str = "INKBOARD_WS_URL";

pub const DEFAULT_API_URL: &str = "http://localhost:3030";
pub const DEFAULT_WS_URL: &str = "ws://localhost:3030/ws";

/// Invalid endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },
    #[error("{var} must use one of {expected:?}, got {scheme}")]
    WrongScheme {
        var: &'static str,
        scheme: String,
        expected: &'static [&'static str],
    },
}

/// Where the REST API and the real-time channel live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: Url,
    pub ws_url: Url,
}

impl ClientConfig {
    /// Read from the process environment, falling back to localhost defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |var: &str, default: &str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let api_url = parse(
            API_URL_VAR,
            &value(API_URL_VAR, DEFAULT_API_URL),
            &["http", "https"],
        )?;
        let ws_url = parse(WS_URL_VAR, &value(WS_URL_VAR, DEFAULT_WS_URL), &["ws", "wss"])?;
        log::debug!("client config: api={} ws={}", api_url, ws_url);
        Ok(Self { api_url, ws_url })
    }
}

fn parse(
    var: &'static str,
    raw: &str,
    expected: &'static [&'static str],
) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })?;
    if !expected.contains(&url.scheme()) {
        return Err(ConfigError::WrongScheme {
            var,
            scheme: url.scheme().to_string(),
            expected,
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:3030/");
        assert_eq!(config.ws_url.as_str(), "ws://localhost:3030/ws");
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(|var| match var {
            API_URL_VAR => Some("https://board.example.com".to_string()),
            WS_URL_VAR => Some("wss://board.example.com/ws".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.api_url.scheme(), "https");
        assert_eq!(config.ws_url.host_str(), Some("board.example.com"));
    }

    #[test]
    fn test_blank_value_uses_default() {
        let config = ClientConfig::from_lookup(|_| Some("  ".to_string())).unwrap();
        assert_eq!(config, ClientConfig::from_lookup(|_| None).unwrap());
    }

    #[test]
    fn test_wrong_scheme_rejected() {
        let err = ClientConfig::from_lookup(|var| {
            (var == WS_URL_VAR).then(|| "http://localhost:3030/ws".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::WrongScheme { var: WS_URL_VAR, .. }));
    }

    #[test]
    fn test_garbage_rejected() {
        let err = ClientConfig::from_lookup(|var| {
            (var == API_URL_VAR).then(|| "not a url".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { var: API_URL_VAR, .. }));
    }
}
