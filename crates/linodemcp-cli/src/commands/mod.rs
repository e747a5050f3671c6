//! CLI command implementations for the linodemcp server.

pub mod check;
pub mod serve;
pub mod tools;

use anyhow::{Context, Result};
use linodemcp_client::{ClientFactory, Credential};
use linodemcp_core::LinodeMcpConfig;
use linodemcp_mcp::AccountManager;
use std::path::Path;
use std::sync::Arc;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "linodemcp.yaml";

/// Load and validate the configuration.
///
/// A missing file is only tolerated at the default location, where it means
/// "all defaults plus the `LINODE_TOKEN` fallback".
pub fn load_config(path: &Path) -> Result<LinodeMcpConfig> {
    let config = if path.exists() {
        LinodeMcpConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?
    } else if path == Path::new(DEFAULT_CONFIG) {
        LinodeMcpConfig::default()
    } else {
        anyhow::bail!("Configuration file not found: {}", path.display());
    };

    let config = config.with_env_fallback();
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Register every configured account and select the initial one.
pub async fn register_accounts(
    config: &LinodeMcpConfig,
    factory: Arc<dyn ClientFactory>,
) -> Result<AccountManager> {
    register_accounts_with(config, factory, |key| std::env::var(key).ok()).await
}

pub(crate) async fn register_accounts_with(
    config: &LinodeMcpConfig,
    factory: Arc<dyn ClientFactory>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AccountManager> {
    let accounts =
        AccountManager::new(factory, config.cache.ttl()).context("Invalid cache settings")?;

    for account in &config.accounts {
        let token = account.resolve_token_with(&lookup)?;
        accounts
            .register(&account.name, account.display_label(), &Credential::new(token))
            .await
            .with_context(|| format!("Failed to register account '{}'", account.name))?;
    }

    if let Some(name) = config.initial_account() {
        accounts.set_current(name).await?;
        tracing::info!(account = name, "current account selected");
    }
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linodemcp_client::fake::{FakeClient, FakeClientFactory};
    use std::io::Write;

    const CONFIG: &str = r#"
cache:
  ttl_secs: 60
accounts:
  - name: personal
    label: Personal
    token_env: TEST_PERSONAL_TOKEN
  - name: work
    token: token-work
current_account: work
"#;

    fn factory() -> Arc<dyn ClientFactory> {
        Arc::new(FakeClientFactory::new(Arc::new(FakeClient::new())))
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.initial_account(), Some("work"));
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"cache:\n  ttl_secs: 0\n").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[tokio::test]
    async fn test_register_accounts_selects_current() {
        let config = LinodeMcpConfig::from_yaml(CONFIG).unwrap();
        let accounts = register_accounts_with(&config, factory(), |key| {
            (key == "TEST_PERSONAL_TOKEN").then(|| "token-personal".to_string())
        })
        .await
        .unwrap();

        assert_eq!(accounts.len().await, 2);
        let current = accounts.get_current().await.unwrap();
        assert_eq!(current.name(), "work");
        assert_eq!(current.label(), "work");
        assert_eq!(accounts.get("personal").await.unwrap().label(), "Personal");
        assert_eq!(current.cache().ttl().as_secs(), 60);
    }

    #[tokio::test]
    async fn test_register_accounts_reports_missing_token() {
        let config = LinodeMcpConfig::from_yaml(CONFIG).unwrap();
        let err = register_accounts_with(&config, factory(), |_| None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("TEST_PERSONAL_TOKEN"));
    }

    #[tokio::test]
    async fn test_register_accounts_rejects_bad_credential() {
        let config = LinodeMcpConfig::from_yaml(
            "accounts:\n  - name: broken\n    token: invalid-token\n",
        )
        .unwrap();
        let err = register_accounts_with(&config, factory(), |_| None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
