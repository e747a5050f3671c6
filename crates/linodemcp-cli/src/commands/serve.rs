//! `linodemcp serve`: run the MCP server until input closes or Ctrl-C.

use super::register_accounts;
use anyhow::{Context, Result};
use clap::Args;
use linodemcp_client::HttpClientFactory;
use linodemcp_core::{LinodeMcpConfig, McpConfig, Transport};
use linodemcp_mcp::{Dispatcher, McpServer, default_registry};
use std::sync::Arc;
use tracing::{info, warn};

/// Arguments for `linodemcp serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Transport type (stdio or http). Overrides config file.
    #[arg(long)]
    pub transport: Option<Transport>,

    /// HTTP bind host. Overrides config file.
    #[arg(long)]
    pub host: Option<String>,

    /// HTTP port. Overrides config file.
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    fn apply(self, mcp: &mut McpConfig) {
        if let Some(transport) = self.transport {
            mcp.transport = transport;
        }
        if let Some(host) = self.host {
            mcp.host = host;
        }
        if let Some(port) = self.port {
            mcp.port = port;
        }
    }
}

pub async fn run(mut config: LinodeMcpConfig, args: ServeArgs) -> Result<()> {
    args.apply(&mut config.mcp);

    let factory = Arc::new(HttpClientFactory::new(config.upstream.clone()));
    let accounts = register_accounts(&config, factory).await?;
    if accounts.is_empty().await {
        warn!(
            "no accounts configured; tool calls will fail until LINODE_TOKEN or accounts are set"
        );
    }

    let registry = default_registry().context("Failed to build tool catalog")?;
    let dispatcher = Dispatcher::new(registry, Arc::new(accounts));
    let server = Arc::new(McpServer::new(config.mcp.clone(), dispatcher));

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            shutdown.cancel();
        }
    });

    info!(
        transport = ?config.mcp.transport,
        tools = server.dispatcher().registry().len(),
        "starting linodemcp"
    );
    let outcome = server.clone().run().await.context("MCP server failed");
    server.dispatcher().accounts().clear().await;
    info!("linodemcp stopped");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file() {
        let mut mcp = McpConfig::default();
        ServeArgs {
            transport: Some(Transport::Http),
            host: None,
            port: Some(8080),
        }
        .apply(&mut mcp);

        assert!(mcp.is_http());
        assert_eq!(mcp.bind_addr(), "127.0.0.1:8080");
    }
}
