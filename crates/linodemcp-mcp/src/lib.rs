//! # linodemcp-mcp
//!
//! MCP (Model Context Protocol) server exposing a Linode cloud account as a
//! fixed catalog of typed tools for AI agents. It provides:
//!
//! - **Account Management**: Several named accounts, one selected at a time
//! - **Reference-Data Cache**: Regions, plan types and kernels cached per account
//!   with a TTL, concurrent misses coalesced into one upstream fetch
//! - **Typed Argument Decoding**: Every tool decodes its arguments into a struct
//!   before touching the network
//! - **Multiple Transports**: stdio and HTTP
//!
//! ## Architecture
//!
//! ```text
//! AI Agent
//!       │
//!       │ MCP protocol (list tools / call tool)
//!       ▼
//! ┌──────────────────────┐
//! │  linodemcp server    │
//! │  1. Look up tool     │  ← ToolRegistry
//! │  2. Current account  │  ← AccountManager
//! │  3. Decode arguments │  ← Arguments
//! │  4. Run handler      │  ← ReferenceCache for catalogs
//! │  5. Render text      │
//! └──────────┬───────────┘
//!            │
//!            ▼
//!     Linode REST API v4
//! ```
//!
//! ## Errors
//!
//! Unknown tools, argument problems, account problems and upstream failures
//! come back as a successful `tools/call` whose result has `isError: true`
//! and a structured error payload. Only cancellation and internal faults turn
//! into JSON-RPC errors.
//!
//! ## Example Usage
//!
//! ```ignore
//! use linodemcp_client::{Credential, HttpClientFactory};
//! use linodemcp_core::{McpConfig, UpstreamConfig};
//! use linodemcp_mcp::{AccountManager, Dispatcher, McpServer, default_registry};
//!
//! let factory = HttpClientFactory::new(UpstreamConfig::default());
//! let accounts = AccountManager::new(Arc::new(factory), Duration::from_secs(300))?;
//! accounts.register("work", "Work", &Credential::new(token)).await?;
//! accounts.set_current("work").await?;
//!
//! let dispatcher = Dispatcher::new(default_registry()?, Arc::new(accounts));
//! Arc::new(McpServer::new(McpConfig::default(), dispatcher)).run().await?;
//! ```

pub mod accounts;
pub mod arguments;
pub mod cache;
pub mod catalog;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod http_transport;
pub mod protocol;
pub mod render;
pub mod server;
pub mod tools;

// Re-export main types
pub use accounts::{Account, AccountError, AccountManager, AccountSummary};
pub use arguments::{ArgumentError, ArgumentReason, Arguments, FromArguments};
pub use cache::{CacheCategory, CacheError, CacheStats, ReferenceCache};
pub use catalog::{default_registry, register_all};
pub use dispatcher::Dispatcher;
pub use error::{McpError, Surface, ToolError};
pub use handlers::ToolHandler;
pub use protocol::{
    CallToolParams, ErrorPayload, JsonRpcRequest, JsonRpcResponse, ToolAnnotations, ToolContent,
    ToolDefinition, ToolResult,
};
pub use server::McpServer;
pub use tools::{FieldKind, InputSchema, RegistryError, ToolRegistry};
