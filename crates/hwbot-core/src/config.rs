use std::time::Duration;

use hwbot_channels::telegram::{describe_recipient, parse_recipient, Recipient};
use hwbot_provider::PRACTICUM_ENDPOINT;

pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const CHAT_ID_VAR: &str = "CHAT_ID";
pub const ENDPOINT_VAR: &str = "PRACTICUM_ENDPOINT";
pub const RETRY_TIME_VAR: &str = "RETRY_TIME";
pub const REQUEST_TIMEOUT_VAR: &str = "REQUEST_TIMEOUT";

pub const DEFAULT_RETRY_SECS: u64 = 600;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    EnvVariableAbsent(Vec<String>),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// Startup configuration, built once and shared read-only.
#[derive(Clone)]
pub struct Settings {
    pub practicum_token: String,
    pub telegram_token: String,
    pub chat: Recipient,
    pub endpoint: String,
    pub retry_interval: Duration,
    /// `None` disables the HTTP timeout.
    pub request_timeout: Option<Duration>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("chat", &describe_recipient(&self.chat))
            .field("endpoint", &self.endpoint)
            .field("retry_interval", &self.retry_interval)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source. Blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let required = [PRACTICUM_TOKEN_VAR, TELEGRAM_TOKEN_VAR, CHAT_ID_VAR];
        let missing: Vec<String> = required
            .iter()
            .filter(|name| get(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::EnvVariableAbsent(missing));
        }

        let practicum_token = get(PRACTICUM_TOKEN_VAR).unwrap_or_default();
        let telegram_token = get(TELEGRAM_TOKEN_VAR).unwrap_or_default();
        let raw_chat = get(CHAT_ID_VAR).unwrap_or_default();
        let chat = parse_recipient(&raw_chat).ok_or_else(|| ConfigError::Invalid {
            name: CHAT_ID_VAR.to_string(),
            reason: format!("expected a numeric chat id or @channel, got {raw_chat:?}"),
        })?;

        let retry_secs = parse_secs(RETRY_TIME_VAR, get(RETRY_TIME_VAR), DEFAULT_RETRY_SECS)?;
        if retry_secs == 0 {
            return Err(ConfigError::Invalid {
                name: RETRY_TIME_VAR.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        let timeout_secs = parse_secs(
            REQUEST_TIMEOUT_VAR,
            get(REQUEST_TIMEOUT_VAR),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            practicum_token,
            telegram_token,
            chat,
            endpoint: get(ENDPOINT_VAR).unwrap_or_else(|| PRACTICUM_ENDPOINT.to_string()),
            retry_interval: Duration::from_secs(retry_secs),
            request_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        })
    }
}

fn parse_secs(name: &str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            reason: format!("expected whole seconds, got {raw:?}"),
        }),
    }
}
