#![deny(unsafe_code)]

//! Configuration loading and validation for Softshell.
//!
//! Loads TOML configuration files and validates them against expected schemas.
//! Provides the [`AppConfig`] type as the central configuration structure,
//! and the [`token`] module for access-token handling.

/// Access-token handling with automatic zeroization.
pub mod token;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use token::AccessToken;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server connection configuration.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Account configuration.
    #[serde(default)]
    pub account: AccountConfig,

    /// Local storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the assistant server endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Name of the environment variable holding the access token.
    /// The token itself never lives in the config file.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token_env: default_token_env(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://app.softshell.dev".to_string()
}

fn default_token_env() -> String {
    "SOFTSHELL_ACCESS_TOKEN".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl ConnectionConfig {
    /// Read the access token from the configured environment variable.
    ///
    /// Returns `None` when the variable is unset or empty.
    pub fn access_token(&self) -> Option<AccessToken> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|value| !value.is_empty())
            .map(AccessToken::new)
    }
}

/// Account configuration.
///
/// The plan determines which models the account can use and which repo-name
/// resolution strategy applies. `free` and `pro` are plans on the hosted
/// service; `enterprise` is a self-hosted server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Account plan: "free", "pro", or "enterprise".
    #[serde(default = "default_plan")]
    pub plan: String,

    /// Username on the server (informational; used in diagnostics).
    #[serde(default)]
    pub username: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            plan: default_plan(),
            username: String::new(),
        }
    }
}

fn default_plan() -> String {
    "free".to_string()
}

/// Local storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON file holding persisted preferences.
    #[serde(default = "default_preferences_path")]
    pub preferences_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            preferences_path: default_preferences_path(),
        }
    }
}

fn default_preferences_path() -> String {
    "data/preferences.json".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.endpoint.is_empty() {
            return Err(ConfigError::Validation(
                "connection.endpoint must not be empty".to_string(),
            ));
        }
        if !self.connection.endpoint.starts_with("http://")
            && !self.connection.endpoint.starts_with("https://")
        {
            return Err(ConfigError::Validation(format!(
                "connection.endpoint must start with \"http://\" or \"https://\", got {:?}",
                self.connection.endpoint
            )));
        }
        if self.connection.token_env.is_empty() {
            return Err(ConfigError::Validation(
                "connection.token_env must not be empty".to_string(),
            ));
        }
        if self.connection.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "connection.request_timeout_secs must be non-zero".to_string(),
            ));
        }

        let valid_plans = ["free", "pro", "enterprise"];
        if !valid_plans.contains(&self.account.plan.as_str()) {
            return Err(ConfigError::Validation(format!(
                "account.plan must be one of {:?}, got {:?}",
                valid_plans, self.account.plan
            )));
        }

        if self.storage.preferences_path.is_empty() {
            return Err(ConfigError::Validation(
                "storage.preferences_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
