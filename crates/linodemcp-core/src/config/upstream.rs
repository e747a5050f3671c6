//! Upstream API configuration types.

use serde::{Deserialize, Serialize};

/// Smallest page size the upstream API accepts.
pub const MIN_PAGE_SIZE: u32 = 25;

/// Largest page size the upstream API accepts.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Configuration for the upstream REST API shared by every account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the REST API, including the version segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Page size requested from paginated list endpoints.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.linode.com/v4".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    100
}
