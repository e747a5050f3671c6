//! Error types for the MCP crate.
//!
//! [`ToolError`] is the taxonomy every tool invocation reports through. Each
//! variant knows whether it surfaces as a tool result (`isError: true`) or
//! as a transport-level failure, and carries a stable kind string for the
//! structured error payload.

use crate::accounts::AccountError;
use crate::arguments::ArgumentError;
use crate::cache::CacheError;
use crate::protocol::ErrorPayload;
use linodemcp_client::UpstreamError;
use thiserror::Error;

/// Errors that can occur in the MCP server itself.
#[derive(Debug, Error)]
pub enum McpError {
    /// Failed to start the server.
    #[error("failed to start MCP server: {0}")]
    StartupFailed(String),

    /// Transport error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Where an error is reported to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// A well-formed result with `isError: true`.
    Tool,
    /// A JSON-RPC error; no tool result is produced.
    Transport,
}

/// Errors raised while dispatching or executing a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("request cancelled")]
    Cancelled,

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl ToolError {
    pub fn surface(&self) -> Surface {
        match self {
            ToolError::Cancelled | ToolError::Internal(_) => Surface::Transport,
            _ => Surface::Tool,
        }
    }

    /// Stable kind string used in structured error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownTool { .. } => "unknown_tool",
            ToolError::Argument(_) => "invalid_arguments",
            ToolError::Account(_) => "account",
            ToolError::Upstream(_) => "upstream",
            ToolError::Cancelled => "cancelled",
            ToolError::Internal(_) => "internal",
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        let (field, reason) = match self {
            ToolError::Argument(err) => (
                Some(err.field.clone()),
                Some(err.reason.code().to_string()),
            ),
            _ => (None, None),
        };
        ErrorPayload {
            kind: self.kind().to_string(),
            message: self.to_string(),
            field,
            reason,
        }
    }
}

impl From<CacheError> for ToolError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Cancelled => ToolError::Cancelled,
            CacheError::Upstream(err) => ToolError::Upstream(err),
            CacheError::InvalidTtl => ToolError::Internal(err.to_string()),
        }
    }
}
