//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use linodemcp_client::Credential;
use linodemcp_client::fake::{FakeClient, FakeClientFactory};
use linodemcp_core::McpConfig;
use linodemcp_mcp::{AccountManager, Dispatcher, McpServer, ToolResult, default_registry};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const TTL: Duration = Duration::from_secs(300);

pub struct Fixture {
    pub fake: Arc<FakeClient>,
    pub accounts: Arc<AccountManager>,
    pub dispatcher: Arc<Dispatcher>,
}

impl Fixture {
    /// A dispatcher over the built-in catalog with no accounts registered.
    pub fn empty(fake: FakeClient) -> Self {
        let fake = Arc::new(fake);
        let factory = FakeClientFactory::new(fake.clone());
        let accounts = Arc::new(AccountManager::new(Arc::new(factory), TTL).unwrap());
        let registry = default_registry().unwrap();
        let dispatcher = Arc::new(Dispatcher::new(registry, accounts.clone()));
        Self {
            fake,
            accounts,
            dispatcher,
        }
    }

    /// Like [`Fixture::empty`] with account `work` registered and current.
    pub async fn with_account(fake: FakeClient) -> Self {
        let fixture = Self::empty(fake);
        fixture
            .accounts
            .register("work", "Work", &Credential::new("token-work"))
            .await
            .unwrap();
        fixture.accounts.set_current("work").await.unwrap();
        fixture
    }

    pub async fn call(&self, name: &str, arguments: Value) -> ToolResult {
        self.dispatcher
            .dispatch(&CancellationToken::new(), name, arguments)
            .await
            .unwrap()
    }
}

/// An MCP server wrapping a fixture with account `work` current.
pub async fn server(fake: FakeClient) -> (Arc<McpServer>, Arc<FakeClient>) {
    let fixture = Fixture::with_account(fake).await;
    let dispatcher = Arc::try_unwrap(fixture.dispatcher)
        .unwrap_or_else(|_| panic!("dispatcher still shared"));
    (
        Arc::new(McpServer::new(McpConfig::default(), dispatcher)),
        fixture.fake,
    )
}
