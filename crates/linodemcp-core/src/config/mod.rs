//! Configuration types for the linodemcp server.
//!
//! Configuration is loaded from a single YAML file (`linodemcp.yaml` by
//! default). Every section is optional; missing sections take their defaults.
//!
//! # Sections
//!
//! - **mcp**: transport selection and HTTP bind address
//! - **upstream**: REST API base URL, timeout and page size
//! - **cache**: reference-data cache TTL
//! - **logging**: default log filter
//! - **accounts** / **current_account**: the named credentials served by the
//!   account manager

pub mod accounts;
pub mod cache;
pub mod logging;
pub mod mcp;
pub mod upstream;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub use accounts::AccountConfig;
pub use cache::CacheConfig;
pub use logging::LoggingConfig;
pub use mcp::{McpConfig, Transport};
pub use upstream::{MAX_PAGE_SIZE, MIN_PAGE_SIZE, UpstreamConfig};

use crate::{DEFAULT_ACCOUNT_NAME, DEFAULT_TOKEN_ENV};

/// Complete linodemcp configuration loaded from file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinodeMcpConfig {
    /// MCP server configuration.
    #[serde(default)]
    pub mcp: McpConfig,

    /// Upstream REST API settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Reference-data cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Configured accounts.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,

    /// Account selected at startup. Defaults to the first configured account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_account: Option<String>,
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("account '{account}' reads its token from ${var}, which is not set")]
    MissingToken { account: String, var: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LinodeMcpConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Synthesise a `default` account from `LINODE_TOKEN` when none are configured.
    pub fn with_env_fallback(self) -> Self {
        self.with_env_fallback_from(|key| std::env::var(key).ok())
    }

    /// Same as [`with_env_fallback`](Self::with_env_fallback) with an explicit
    /// environment lookup.
    pub fn with_env_fallback_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.accounts.is_empty() && lookup(DEFAULT_TOKEN_ENV).is_some() {
            self.accounts.push(AccountConfig::from_env(
                DEFAULT_ACCOUNT_NAME,
                DEFAULT_TOKEN_ENV,
            ));
        }
        self
    }

    /// Name of the account that should be current after startup.
    pub fn initial_account(&self) -> Option<&str> {
        self.current_account
            .as_deref()
            .or_else(|| self.accounts.first().map(|a| a.name.as_str()))
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Config(
                "cache.ttl_secs must be positive".to_string(),
            ));
        }

        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::Config(
                "upstream.timeout_secs must be positive".to_string(),
            ));
        }

        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.upstream.page_size) {
            return Err(ConfigError::Config(format!(
                "upstream.page_size must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}"
            )));
        }

        let mut seen = HashSet::new();
        for account in &self.accounts {
            account.validate()?;
            if !seen.insert(account.name.as_str()) {
                return Err(ConfigError::Config(format!(
                    "duplicate account name '{}'",
                    account.name
                )));
            }
        }

        if let Some(current) = &self.current_account {
            if !seen.contains(current.as_str()) {
                return Err(ConfigError::Config(format!(
                    "current_account '{current}' is not a configured account"
                )));
            }
        }

        Ok(())
    }
}
