//! Configuration types shared across the linodemcp crates.

pub mod config;

pub use config::{
    AccountConfig, CacheConfig, ConfigError, LinodeMcpConfig, LoggingConfig, McpConfig,
    Transport, UpstreamConfig,
};

/// Environment variable consulted when no accounts are configured.
pub const DEFAULT_TOKEN_ENV: &str = "LINODE_TOKEN";

/// Name given to the account synthesised from [`DEFAULT_TOKEN_ENV`].
pub const DEFAULT_ACCOUNT_NAME: &str = "default";
