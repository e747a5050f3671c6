//! Error types for upstream API calls.

use thiserror::Error;

/// Errors returned by upstream operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// The credential cannot be used to build a client.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The API answered with a non-success status.
    #[error("upstream returned HTTP {status}: {}", .reasons.join("; "))]
    Api { status: u16, reasons: Vec<String> },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("could not decode upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Whether the upstream reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::Api { status: 404, .. })
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}
