//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Logging settings applied when the subscriber is installed.
///
/// `RUST_LOG` takes precedence over `level` when it is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `info` or `linodemcp_mcp=debug`.
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit ANSI colour codes.
    #[serde(default)]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            ansi: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
