//! Client configuration resolved from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:4000/api";
pub const ENV_API_BASE_URL: &str = "OFFERDESK_API_BASE_URL";
pub const ENV_REFRESH_TIMEOUT_MS: &str = "OFFERDESK_REFRESH_TIMEOUT_MS";
pub const ENV_SESSION_FILE: &str = "OFFERDESK_SESSION_FILE";
pub const ENV_FIELD_CONFIG: &str = "OFFERDESK_FIELD_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("base url must not be empty")]
    EmptyBaseUrl,
    #[error("base url must use http:// or https:// and include a host")]
    InvalidBaseUrl,
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Upper bound on a single token refresh. `None` waits indefinitely.
    pub refresh_timeout: Option<Duration>,
    /// Durable session file; `None` means the platform default.
    pub session_file: Option<PathBuf>,
    /// Per-role field map JSON.
    pub field_config: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            refresh_timeout: None,
            session_file: None,
            field_config: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup (environment, test fixture, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base_url = match non_empty(ENV_API_BASE_URL) {
            Some(raw) => normalize_base_url(&raw)?,
            None => DEFAULT_API_BASE_URL.to_string(),
        };

        let refresh_timeout = non_empty(ENV_REFRESH_TIMEOUT_MS)
            .map(|raw| match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
                _ => Err(ConfigError::InvalidNumber {
                    key: ENV_REFRESH_TIMEOUT_MS,
                    value: raw,
                }),
            })
            .transpose()?;

        Ok(Self {
            base_url,
            refresh_timeout,
            session_file: non_empty(ENV_SESSION_FILE).map(PathBuf::from),
            field_config: non_empty(ENV_FIELD_CONFIG).map(PathBuf::from),
        })
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    let Some((scheme, remainder)) = trimmed.split_once("://") else {
        return Err(ConfigError::InvalidBaseUrl);
    };
    if !matches!(scheme, "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl);
    }
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(ConfigError::InvalidBaseUrl);
    }
    Ok(trimmed.to_string())
}
