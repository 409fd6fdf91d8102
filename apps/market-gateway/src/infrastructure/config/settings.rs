//! Gateway Configuration Settings
//!
//! Configuration types for the market gateway, loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use crate::application::ports::GatewayMode;

/// Default upstream gateway.
pub const DEFAULT_GATEWAY_URL: &str = "https://api.topstepx.io";

/// Upstream gateway API key.
#[derive(Clone, Default)]
pub struct ApiCredentials {
    api_key: String,
}

impl ApiCredentials {
    /// Create new credentials.
    #[must_use]
    pub const fn new(api_key: String) -> Self {
        Self { api_key }
    }

    /// Get the API key. Empty when none is configured.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Bind address.
    pub host: [u8; 4],
    /// HTTP port serving the API, WebSocket, health and metrics.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: [0, 0, 0, 0],
            port: 4000,
        }
    }
}

/// Upstream gateway settings, used in live mode.
#[derive(Debug, Clone)]
pub struct LiveSettings {
    /// Gateway base URL.
    pub base_url: String,
    /// Gateway API key.
    pub credentials: ApiCredentials,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            credentials: ApiCredentials::default(),
        }
    }
}

/// Simulated stream settings, used in mock mode.
#[derive(Debug, Clone)]
pub struct MockStreamSettings {
    /// Time between emissions.
    pub interval: Duration,
    /// Quotes buffered per subscriber before new ones are dropped.
    pub capacity: usize,
}

impl Default for MockStreamSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            capacity: 64,
        }
    }
}

/// Complete gateway configuration.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Backend mode.
    pub mode: GatewayMode,
    /// Server settings.
    pub server: ServerSettings,
    /// Upstream gateway settings.
    pub live: LiveSettings,
    /// Simulated stream settings.
    pub mock: MockStreamSettings,
}

impl GatewayConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mode = GatewayMode::from_live_flag(lookup("USE_LIVE_GATEWAY").as_deref());

        let server = ServerSettings {
            port: parse_or(&lookup, "PORT", ServerSettings::default().port)?,
            ..ServerSettings::default()
        };

        let base_url = lookup("TOPSTEP_GATEWAY_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "TOPSTEP_GATEWAY_URL".to_string(),
                reason: format!("expected an http(s) URL, got {base_url:?}"),
            });
        }

        let live = LiveSettings {
            base_url,
            credentials: ApiCredentials::new(lookup("TOPSTEP_GATEWAY_KEY").unwrap_or_default()),
        };

        let interval_ms: u64 = parse_or(&lookup, "MOCK_STREAM_INTERVAL_MS", 2000)?;
        let capacity: usize = parse_or(&lookup, "MOCK_STREAM_CAPACITY", 64)?;
        if interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MOCK_STREAM_INTERVAL_MS".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MOCK_STREAM_CAPACITY".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            mode,
            server,
            live,
            mock: MockStreamSettings {
                interval: Duration::from_millis(interval_ms),
                capacity,
            },
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has an unusable value.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        }),
    }
}
