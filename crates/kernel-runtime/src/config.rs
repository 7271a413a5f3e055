//! # Kernel Configuration
//!
//! Unified configuration for the bus, the authenticator and logging.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. TOML file named by `CK_CONFIG`
//! 3. Environment overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CK_MAX_LOGIN_FAILURE` | `auth.max_login_failure` |
//! | `CK_BAN_LENGTH_SECONDS` | `auth.ban_length_secs` |
//! | `CK_TOKEN_TTL_SECONDS` | `auth.token_ttl_secs` |
//! | `CK_BUS_CAPACITY` | `bus.capacity` |
//! | `CK_LOG_LEVEL` or `RUST_LOG` | `telemetry.log_level` |
//! | `CK_JSON_LOGS` | `telemetry.json_logs` |

use kernel_auth::AuthConfig;
use kernel_bus::{BusConfig, DEFAULT_PUBLISH_RETRY_MS, DEFAULT_QUEUE_CAPACITY};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "CK_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for `KernelConfig`.
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// An environment override could not be parsed.
    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    /// Values parsed but cannot be used together.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete kernel configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Event bus configuration.
    pub bus: BusSettings,
    /// Token and ban configuration.
    pub auth: AuthConfig,
    /// Logging configuration.
    pub telemetry: TelemetryConfig,
    /// Development user store.
    pub credentials: Vec<CredentialEntry>,
}

/// Event bus configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BusSettings {
    /// Queue capacity before producers block.
    pub capacity: usize,
    /// Blocked producer retry interval in milliseconds.
    pub publish_retry_ms: u64,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            publish_retry_ms: DEFAULT_PUBLISH_RETRY_MS,
        }
    }
}

impl BusSettings {
    pub fn to_bus_config(&self) -> BusConfig {
        BusConfig {
            capacity: self.capacity,
            publish_retry_interval: Duration::from_millis(self.publish_retry_ms),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive, e.g. `info` or `kernel_bus=debug,info`.
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,
    /// Include thread ids in each line.
    pub thread_ids: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            thread_ids: true,
        }
    }
}

/// One login accepted by the static verifier.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialEntry {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

impl KernelConfig {
    /// Load from `CK_CONFIG` (if set) and the process environment, then
    /// validate.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|var| std::env::var(var).ok())
    }

    /// [`KernelConfig::load`] with an explicit variable lookup.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`].
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. Missing sections and fields take their defaults.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Read`
    /// - `ConfigError::Parse`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// Apply `CK_*` overrides.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidEnv` - a set variable does not parse
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = parse_var(&lookup, "CK_MAX_LOGIN_FAILURE")? {
            self.auth.max_login_failure = v;
        }
        if let Some(v) = parse_var(&lookup, "CK_BAN_LENGTH_SECONDS")? {
            self.auth.ban_length_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "CK_TOKEN_TTL_SECONDS")? {
            self.auth.token_ttl_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "CK_BUS_CAPACITY")? {
            self.bus.capacity = v;
        }
        if let Some(level) = lookup("CK_LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
            self.telemetry.log_level = level;
        }
        if let Some(v) = lookup("CK_JSON_LOGS") {
            self.telemetry.json_logs = v.eq_ignore_ascii_case("true") || v == "1";
        }
        Ok(())
    }

    /// Reject values the kernel cannot run with.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Invalid`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.max_login_failure == 0 {
            return Err(ConfigError::Invalid(
                "auth.max_login_failure must be at least 1".into(),
            ));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "auth.token_ttl_secs must be at least 1".into(),
            ));
        }
        if self.bus.capacity == 0 {
            return Err(ConfigError::Invalid("bus.capacity must be at least 1".into()));
        }
        let name = &self.auth.cookie_name;
        if name.is_empty() || name.contains(|c: char| c == ';' || c == '=' || c.is_whitespace()) {
            return Err(ConfigError::Invalid(format!(
                "auth.cookie_name {name:?} is not a valid cookie name"
            )));
        }
        if let Some(entry) = self.credentials.iter().find(|e| e.login.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "credential entry {entry:?} has an empty login"
            )));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}
