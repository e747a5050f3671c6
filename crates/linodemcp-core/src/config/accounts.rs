//! Account configuration types.
//!
//! Each configured account names one API credential. The credential can be
//! provided inline (`token`) or by reference to an environment variable
//! (`token_env`); exactly one of the two must be present.

use super::ConfigError;
use serde::{Deserialize, Serialize};

/// One configured cloud account.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Unique account name used to select the account.
    pub name: String,

    /// Human-readable label. Defaults to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Inline API token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable holding the API token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_env", &self.token_env)
            .finish()
    }
}

impl AccountConfig {
    /// Build an account whose token is read from `token_env`.
    pub fn from_env(name: impl Into<String>, token_env: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            token: None,
            token_env: Some(token_env.into()),
        }
    }

    /// The label to display, falling back to the account name.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Resolve the token from the process environment.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        self.resolve_token_with(|key| std::env::var(key).ok())
    }

    /// Resolve the token using `lookup` for environment access.
    pub fn resolve_token_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, ConfigError> {
        match (&self.token, &self.token_env) {
            (Some(token), None) => Ok(token.clone()),
            (None, Some(var)) => lookup(var).ok_or_else(|| ConfigError::MissingToken {
                account: self.name.clone(),
                var: var.clone(),
            }),
            _ => Err(ConfigError::Config(format!(
                "account '{}' must set exactly one of token or token_env",
                self.name
            ))),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() || !self.name.is_ascii() {
            return Err(ConfigError::Config(format!(
                "account name '{}' must be non-empty ASCII",
                self.name
            )));
        }
        if self.token.is_some() == self.token_env.is_some() {
            return Err(ConfigError::Config(format!(
                "account '{}' must set exactly one of token or token_env",
                self.name
            )));
        }
        Ok(())
    }
}
