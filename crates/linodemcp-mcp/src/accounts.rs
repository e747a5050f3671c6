//! Account records and the process-wide account manager.
//!
//! An [`Account`] pairs a name and label with the upstream client built from
//! its credential and the account's own reference cache. Records are handed
//! out as `Arc<Account>`, so removing an account only drops the manager's
//! reference and calls already holding the record run to completion.
//!
//! The manager keeps the account map and the current-account slot behind one
//! `RwLock`, so lookups of the current account never observe a removal
//! halfway through.

use crate::cache::{CacheError, ReferenceCache};
use linodemcp_client::{ClientFactory, Credential, UpstreamClient, UpstreamError};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors raised by account management.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("invalid account name '{0}': must be non-empty ASCII")]
    InvalidName(String),

    #[error("account '{0}' already exists")]
    DuplicateName(String),

    #[error("invalid credential for account '{name}': {source}")]
    InvalidCredential {
        name: String,
        #[source]
        source: UpstreamError,
    },

    #[error("unknown account '{0}'")]
    UnknownAccount(String),

    #[error("no current account selected")]
    NoCurrentAccount,
}

/// One registered cloud account.
pub struct Account {
    name: String,
    label: String,
    client: Arc<dyn UpstreamClient>,
    cache: Arc<ReferenceCache>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl Account {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        client: Arc<dyn UpstreamClient>,
        cache: Arc<ReferenceCache>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            client,
            cache,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The upstream client bound to this account's credential.
    pub fn client(&self) -> &dyn UpstreamClient {
        self.client.as_ref()
    }

    /// The account's reference-data cache.
    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }
}

/// Listing entry for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub name: String,
    pub label: String,
    pub current: bool,
}

#[derive(Default)]
struct Registry {
    accounts: HashMap<String, Arc<Account>>,
    current: Option<String>,
}

/// Registry of named accounts with one optional current account.
pub struct AccountManager {
    factory: Arc<dyn ClientFactory>,
    cache_ttl: Duration,
    registry: RwLock<Registry>,
}

impl fmt::Debug for AccountManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountManager")
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

impl AccountManager {
    /// Create an empty manager. Every registered account gets a cache with `cache_ttl`.
    pub fn new(factory: Arc<dyn ClientFactory>, cache_ttl: Duration) -> Result<Self, CacheError> {
        if cache_ttl.is_zero() {
            return Err(CacheError::InvalidTtl);
        }
        Ok(Self {
            factory,
            cache_ttl,
            registry: RwLock::new(Registry::default()),
        })
    }

    /// Build a client for `credential` and install a new account.
    ///
    /// Nothing is inserted when the client cannot be built.
    pub async fn register(
        &self,
        name: &str,
        label: &str,
        credential: &Credential,
    ) -> Result<Arc<Account>, AccountError> {
        if name.is_empty() || !name.is_ascii() {
            return Err(AccountError::InvalidName(name.to_string()));
        }

        let client = self
            .factory
            .connect(credential)
            .map_err(|source| AccountError::InvalidCredential {
                name: name.to_string(),
                source,
            })?;
        let account = Arc::new(Account::new(
            name,
            label,
            client,
            Arc::new(ReferenceCache::build(self.cache_ttl)),
        ));

        let mut registry = self.registry.write().await;
        if registry.accounts.contains_key(name) {
            return Err(AccountError::DuplicateName(name.to_string()));
        }
        registry.accounts.insert(name.to_string(), account.clone());
        tracing::info!(account = name, "account registered");
        Ok(account)
    }

    /// Make `name` the current account.
    pub async fn set_current(&self, name: &str) -> Result<(), AccountError> {
        let mut registry = self.registry.write().await;
        if !registry.accounts.contains_key(name) {
            return Err(AccountError::UnknownAccount(name.to_string()));
        }
        registry.current = Some(name.to_string());
        tracing::info!(account = name, "current account switched");
        Ok(())
    }

    /// The current account.
    pub async fn get_current(&self) -> Result<Arc<Account>, AccountError> {
        let registry = self.registry.read().await;
        let name = registry
            .current
            .as_deref()
            .ok_or(AccountError::NoCurrentAccount)?;
        registry
            .accounts
            .get(name)
            .cloned()
            .ok_or_else(|| AccountError::UnknownAccount(name.to_string()))
    }

    /// Look up an account by name.
    pub async fn get(&self, name: &str) -> Result<Arc<Account>, AccountError> {
        self.registry
            .read()
            .await
            .accounts
            .get(name)
            .cloned()
            .ok_or_else(|| AccountError::UnknownAccount(name.to_string()))
    }

    /// All accounts, ordered by name.
    pub async fn list(&self) -> Vec<AccountSummary> {
        let registry = self.registry.read().await;
        let mut summaries: Vec<_> = registry
            .accounts
            .values()
            .map(|account| AccountSummary {
                name: account.name.clone(),
                label: account.label.clone(),
                current: registry.current.as_deref() == Some(account.name.as_str()),
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Remove an account, clearing the current slot if it pointed at it.
    pub async fn remove(&self, name: &str) -> Result<(), AccountError> {
        let mut registry = self.registry.write().await;
        if registry.accounts.remove(name).is_none() {
            return Err(AccountError::UnknownAccount(name.to_string()));
        }
        if registry.current.as_deref() == Some(name) {
            registry.current = None;
        }
        tracing::info!(account = name, "account removed");
        Ok(())
    }

    /// Replace an account's label, keeping its client and cache.
    pub async fn relabel(&self, name: &str, label: &str) -> Result<Arc<Account>, AccountError> {
        let mut registry = self.registry.write().await;
        let existing = registry
            .accounts
            .get(name)
            .ok_or_else(|| AccountError::UnknownAccount(name.to_string()))?;
        let relabeled = Arc::new(Account {
            name: existing.name.clone(),
            label: label.to_string(),
            client: existing.client.clone(),
            cache: existing.cache.clone(),
        });
        registry.accounts.insert(name.to_string(), relabeled.clone());
        Ok(relabeled)
    }

    /// Unset the current account, keeping every registered record.
    pub async fn clear_current(&self) {
        self.registry.write().await.current = None;
    }

    pub async fn len(&self) -> usize {
        self.registry.read().await.accounts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.read().await.accounts.is_empty()
    }

    /// Drop every account. Used at shutdown.
    pub async fn clear(&self) {
        let mut registry = self.registry.write().await;
        registry.current = None;
        registry.accounts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linodemcp_client::ProfileApi;
    use linodemcp_client::fake::{FakeClient, FakeClientFactory};

    fn manager() -> AccountManager {
        let factory = FakeClientFactory::new(Arc::new(FakeClient::new()));
        AccountManager::new(Arc::new(factory), Duration::from_secs(300)).unwrap()
    }

    fn token() -> Credential {
        Credential::new("valid-token")
    }

    #[tokio::test]
    async fn test_register_and_select() {
        let manager = manager();
        manager.register("work", "Work", &token()).await.unwrap();

        let err = manager.get_current().await.unwrap_err();
        assert!(matches!(err, AccountError::NoCurrentAccount));
        assert!(err.to_string().contains("account"));

        manager.set_current("work").await.unwrap();
        let current = manager.get_current().await.unwrap();
        assert_eq!(current.name(), "work");
        assert_eq!(current.label(), "Work");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let manager = manager();
        manager.register("work", "Work", &token()).await.unwrap();
        let err = manager.register("work", "Other", &token()).await.unwrap_err();
        assert!(matches!(err, AccountError::DuplicateName(_)));
        assert_eq!(manager.get("work").await.unwrap().label(), "Work");
    }

    #[tokio::test]
    async fn test_invalid_credential_inserts_nothing() {
        let manager = manager();
        let err = manager
            .register("work", "Work", &Credential::new("invalid-token"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredential { .. }));
        assert!(manager.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_names_rejected() {
        let manager = manager();
        for name in ["", "compte-é"] {
            let err = manager.register(name, "x", &token()).await.unwrap_err();
            assert!(matches!(err, AccountError::InvalidName(_)));
        }
    }

    #[tokio::test]
    async fn test_set_current_unknown() {
        let manager = manager();
        let err = manager.set_current("ghost").await.unwrap_err();
        assert!(matches!(err, AccountError::UnknownAccount(_)));
    }

    #[tokio::test]
    async fn test_remove_current_clears_slot() {
        let manager = manager();
        manager.register("a", "A", &token()).await.unwrap();
        manager.register("b", "B", &token()).await.unwrap();
        manager.set_current("a").await.unwrap();

        manager.remove("b").await.unwrap();
        assert_eq!(manager.get_current().await.unwrap().name(), "a");

        manager.remove("a").await.unwrap();
        assert!(matches!(
            manager.get_current().await,
            Err(AccountError::NoCurrentAccount)
        ));
        assert!(matches!(
            manager.remove("a").await,
            Err(AccountError::UnknownAccount(_))
        ));
    }

    #[tokio::test]
    async fn test_removed_account_drains() {
        let manager = manager();
        manager.register("a", "A", &token()).await.unwrap();
        manager.set_current("a").await.unwrap();
        let held = manager.get_current().await.unwrap();

        manager.remove("a").await.unwrap();
        assert_eq!(held.name(), "a");
        assert!(held.client().get_profile().await.is_ok());
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let manager = manager();
        for name in ["zeta", "alpha", "mid"] {
            manager.register(name, name, &token()).await.unwrap();
        }
        manager.set_current("mid").await.unwrap();

        let listed = manager.list().await;
        let names: Vec<_> = listed.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
        assert!(listed[1].current);
        assert!(!listed[0].current);
    }

    #[tokio::test]
    async fn test_relabel_keeps_cache() {
        let manager = manager();
        let before = manager.register("a", "A", &token()).await.unwrap();
        let after = manager.relabel("a", "Renamed").await.unwrap();

        assert_eq!(after.label(), "Renamed");
        assert!(std::ptr::eq(before.cache(), after.cache()));
        assert_eq!(manager.get("a").await.unwrap().label(), "Renamed");
    }

    #[tokio::test]
    async fn test_clear_current_unbinds_but_keeps_accounts() {
        let manager = manager();
        manager.register("a", "A", &token()).await.unwrap();
        manager.set_current("a").await.unwrap();

        manager.clear_current().await;
        assert!(matches!(
            manager.get_current().await,
            Err(AccountError::NoCurrentAccount)
        ));
        assert_eq!(manager.len().await, 1);
        assert!(manager.list().await.iter().all(|s| !s.current));

        manager.set_current("a").await.unwrap();
        assert_eq!(manager.get_current().await.unwrap().name(), "a");
    }

    #[tokio::test]
    async fn test_clear() {
        let manager = manager();
        manager.register("a", "A", &token()).await.unwrap();
        manager.set_current("a").await.unwrap();
        manager.clear().await;
        assert_eq!(manager.len().await, 0);
        assert!(manager.get_current().await.is_err());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let factory = FakeClientFactory::new(Arc::new(FakeClient::new()));
        assert!(AccountManager::new(Arc::new(factory), Duration::ZERO).is_err());
    }
}
