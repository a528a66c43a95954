//! Configuration management for the marketplace client.
//!
//! Loads configuration from environment variables with sensible defaults.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `BOXOFFICE_API_URL` | `https://ticketing-marketplace.onrender.com/api/v1` |
//! | `BOXOFFICE_WS_URL` | API origin with a `ws`/`wss` scheme |
//! | `BOXOFFICE_TIMEOUT_SECS` | `30` |
//! | `BOXOFFICE_SESSION_LIFETIME_SECS` | `900` |
//! | `BOXOFFICE_REFRESH_BUFFER_SECS` | `120` |
//! | `BOXOFFICE_AUTH_STORAGE` | unset (auth state kept in memory) |

use boxoffice_runtime::{SessionConfig, SessionConfigError};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Production API base URL.
pub const DEFAULT_API_URL: &str = "https://ticketing-marketplace.onrender.com/api/v1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("{name} must be a whole number of seconds, got {value:?}")]
    InvalidNumber {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },

    /// A URL has the wrong scheme.
    #[error("{name} must start with {expected}, got {value:?}")]
    InvalidUrl {
        /// Variable name.
        name: &'static str,
        /// Accepted schemes.
        expected: &'static str,
        /// Raw value.
        value: String,
    },

    /// Session timing is unusable.
    #[error(transparent)]
    Session(#[from] SessionConfigError),
}

/// Realtime connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeConfig {
    /// WebSocket endpoint.
    pub url: String,
    /// Wait before each reconnection attempt.
    pub reconnect_delay: Duration,
    /// Reconnection attempts before giving up.
    pub max_reconnect_attempts: u32,
}

impl RealtimeConfig {
    /// Settings for `url` with the default reconnection policy (1 s, 5 attempts).
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_attempts: 5,
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST base URL, without a trailing slash.
    pub api_url: String,
    /// Realtime settings.
    pub realtime: RealtimeConfig,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Session timing.
    pub session: SessionConfig,
    /// Directory for persisted auth state.
    pub auth_storage: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Defaults against `api_url`.
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            realtime: RealtimeConfig::new(ws_url_for(&api_url)),
            api_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session: SessionConfig::default(),
            auth_storage: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is malformed or the session
    /// timing is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is malformed or the session
    /// timing is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("BOXOFFICE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                name: "BOXOFFICE_API_URL",
                expected: "http:// or https://",
                value: api_url,
            });
        }
        let mut config = Self::new(api_url);

        if let Some(ws_url) = lookup("BOXOFFICE_WS_URL") {
            if !(ws_url.starts_with("ws://") || ws_url.starts_with("wss://")) {
                return Err(ConfigError::InvalidUrl {
                    name: "BOXOFFICE_WS_URL",
                    expected: "ws:// or wss://",
                    value: ws_url,
                });
            }
            config.realtime.url = ws_url;
        }

        let seconds = |name: &'static str| -> Result<Option<Duration>, ConfigError> {
            lookup(name)
                .map(|value| {
                    value
                        .trim()
                        .parse::<u64>()
                        .map(Duration::from_secs)
                        .map_err(|_| ConfigError::InvalidNumber { name, value })
                })
                .transpose()
        };

        if let Some(timeout) = seconds("BOXOFFICE_TIMEOUT_SECS")? {
            config.timeout = timeout;
        }
        let lifetime = seconds("BOXOFFICE_SESSION_LIFETIME_SECS")?.unwrap_or(config.session.lifetime);
        let buffer = seconds("BOXOFFICE_REFRESH_BUFFER_SECS")?.unwrap_or(config.session.refresh_buffer);
        config.session = SessionConfig::new(lifetime, buffer)?;

        config.auth_storage = lookup("BOXOFFICE_AUTH_STORAGE")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    /// Builder: set the realtime endpoint.
    #[must_use]
    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.realtime.url = url.into();
        self
    }

    /// Builder: set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder: set session timing.
    #[must_use]
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Builder: persist auth state under `dir`.
    #[must_use]
    pub fn with_auth_storage(mut self, dir: impl Into<PathBuf>) -> Self {
        self.auth_storage = Some(dir.into());
        self
    }

    /// Builder: set the reconnection policy.
    #[must_use]
    pub const fn with_reconnect(mut self, delay: Duration, max_attempts: u32) -> Self {
        self.realtime.reconnect_delay = delay;
        self.realtime.max_reconnect_attempts = max_attempts;
        self
    }
}

/// The realtime server listens on the API origin.
fn ws_url_for(api_url: &str) -> String {
    let (scheme, rest) = match api_url.split_once("://") {
        Some(("https", rest)) => ("wss", rest),
        Some((_, rest)) => ("ws", rest),
        None => ("ws", api_url),
    };
    let host = rest.split('/').next().unwrap_or(rest);
    format!("{scheme}://{host}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.realtime.url, "wss://ticketing-marketplace.onrender.com");
        assert_eq!(config.realtime.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.realtime.max_reconnect_attempts, 5);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.auth_storage, None);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("BOXOFFICE_API_URL", "http://localhost:5000/api/v1/"),
            ("BOXOFFICE_TIMEOUT_SECS", "5"),
            ("BOXOFFICE_SESSION_LIFETIME_SECS", "600"),
            ("BOXOFFICE_REFRESH_BUFFER_SECS", "60"),
            ("BOXOFFICE_AUTH_STORAGE", "/tmp/boxoffice"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://localhost:5000/api/v1");
        assert_eq!(config.realtime.url, "ws://localhost:5000");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.session.refresh_interval(), Duration::from_secs(540));
        assert_eq!(config.auth_storage, Some(PathBuf::from("/tmp/boxoffice")));
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = ClientConfig::from_lookup(lookup(&[("BOXOFFICE_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { name: "BOXOFFICE_TIMEOUT_SECS", .. }));

        let err = ClientConfig::from_lookup(lookup(&[("BOXOFFICE_WS_URL", "http://x")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        let err = ClientConfig::from_lookup(lookup(&[
            ("BOXOFFICE_SESSION_LIFETIME_SECS", "60"),
            ("BOXOFFICE_REFRESH_BUFFER_SECS", "120"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Session(SessionConfigError::BufferTooLarge { .. })
        ));
    }
}
