//! `linodemcp check`: validate configuration offline.
//!
//! Resolves every account's token and builds its client, which catches
//! missing environment variables and blank tokens without a network call.

use super::register_accounts;
use anyhow::Result;
use linodemcp_client::HttpClientFactory;
use linodemcp_core::LinodeMcpConfig;
use std::path::Path;
use std::sync::Arc;

pub async fn run(path: &Path, config: &LinodeMcpConfig) -> Result<()> {
    println!("Configuration: {}", path.display());
    println!("  Transport: {:?} ({})", config.mcp.transport, config.mcp.bind_addr());
    println!("  Upstream: {}", config.upstream.base_url);
    println!("  Cache TTL: {}s", config.cache.ttl_secs);

    let factory = Arc::new(HttpClientFactory::new(config.upstream.clone()));
    let accounts = register_accounts(config, factory).await?;

    let summaries = accounts.list().await;
    if summaries.is_empty() {
        println!("  Accounts: none (set LINODE_TOKEN or add accounts)");
    } else {
        println!("  Accounts:");
        for account in summaries {
            let marker = if account.current { " (current)" } else { "" };
            println!("    {} - {}{marker}", account.name, account.label);
        }
    }
    println!("OK");
    Ok(())
}
