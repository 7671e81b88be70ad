//! Client configuration.
//!
//! # Responsibility
//! - Read connection, logging and view-binding settings from environment
//!   variables (or any key lookup, for tests).
//! - Normalize and validate every value before core uses it.
//!
//! # Invariants
//! - A `ClientConfig` always has an `http(s)` base URL and a non-empty token.
//! - Missing optional values fall back to documented defaults.

use crate::logging::{default_log_level, normalize_level};
use crate::view::BindingVersion;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const ENV_BASE_URL: &str = "EDUFAD_BASE_URL";
pub const ENV_TOKEN: &str = "EDUFAD_TOKEN";
pub const ENV_LOG_LEVEL: &str = "EDUFAD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "EDUFAD_LOG_DIR";
pub const ENV_VIEW_BINDINGS: &str = "EDUFAD_VIEW_BINDINGS";
pub const ENV_TIMEOUT_SECS: &str = "EDUFAD_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 600;

/// Validated client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service root, e.g. `https://edufad.example/api/`.
    pub base_url: Url,
    /// Bearer token issued by the session collaborator.
    pub token: String,
    pub log_level: &'static str,
    /// Rolling log directory; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub view_bindings: BindingVersion,
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    /// - Base URL or token missing.
    /// - Any present value fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let raw_base_url = read(ENV_BASE_URL).ok_or(ConfigError::Missing(ENV_BASE_URL))?;
        let base_url = normalize_base_url(&raw_base_url)?;
        let token = read(ENV_TOKEN)
            .map(|value| value.trim().to_string())
            .ok_or(ConfigError::Missing(ENV_TOKEN))?;

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(value) => normalize_level(&value).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };
        let log_dir = read(ENV_LOG_DIR)
            .map(|value| normalize_log_dir(&value))
            .transpose()?;
        let view_bindings = match read(ENV_VIEW_BINDINGS) {
            Some(value) => value
                .parse::<BindingVersion>()
                .map_err(|err| ConfigError::InvalidViewBindings(err.to_string()))?,
            None => BindingVersion::default(),
        };
        let request_timeout = match read(ENV_TIMEOUT_SECS) {
            Some(value) => normalize_timeout(&value)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            base_url,
            token,
            log_level,
            log_dir,
            view_bindings,
            request_timeout,
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| ConfigError::InvalidBaseUrl(format!("{raw}: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidBaseUrl(format!(
            "unsupported scheme `{other}`; expected http or https"
        ))),
    }
}

fn normalize_log_dir(raw: &str) -> Result<PathBuf, ConfigError> {
    let path = Path::new(raw.trim());
    if !path.is_absolute() {
        return Err(ConfigError::InvalidLogDir(raw.trim().to_string()));
    }
    Ok(path.to_path_buf())
}

fn normalize_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if (1..=MAX_TIMEOUT_SECS).contains(&secs) => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.trim().to_string())),
    }
}

/// Configuration problems reported before any remote call happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    InvalidBaseUrl(String),
    InvalidLogLevel(String),
    InvalidLogDir(String),
    InvalidViewBindings(String),
    InvalidTimeout(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required setting {key}"),
            Self::InvalidBaseUrl(message) => write!(f, "invalid base url: {message}"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::InvalidLogDir(value) => {
                write!(f, "log dir must be an absolute path, got `{value}`")
            }
            Self::InvalidViewBindings(message) => write!(f, "invalid view bindings: {message}"),
            Self::InvalidTimeout(value) => write!(
                f,
                "timeout must be a number of seconds in 1..={MAX_TIMEOUT_SECS}, got `{value}`"
            ),
        }
    }
}

impl Error for ConfigError {}
