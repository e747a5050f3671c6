//! Tool dispatch.
//!
//! Per invocation: look up the handler, resolve the current account, decode
//! the argument map, run the handler. Tool-level failures are folded into an
//! `isError` result here; only cancellation and internal invariant
//! violations escape as `Err`.

use crate::accounts::AccountManager;
use crate::arguments::Arguments;
use crate::error::{Surface, ToolError};
use crate::protocol::ToolResult;
use crate::tools::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Routes tool calls to handlers against the current account.
pub struct Dispatcher {
    registry: ToolRegistry,
    accounts: Arc<AccountManager>,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry, accounts: Arc<AccountManager>) -> Self {
        Self { registry, accounts }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn accounts(&self) -> &Arc<AccountManager> {
        &self.accounts
    }

    /// Run tool `name`. `Err` only for transport-level failures.
    pub async fn dispatch(
        &self,
        cancel: &CancellationToken,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResult, ToolError> {
        let started = Instant::now();
        let outcome = self.invoke(cancel, name, arguments).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                tracing::info!(tool = name, elapsed_ms, "tool call completed");
                Ok(result)
            }
            Err(err) if err.surface() == Surface::Tool => {
                tracing::warn!(
                    tool = name,
                    kind = err.kind(),
                    elapsed_ms,
                    error = %err,
                    "tool call failed"
                );
                Ok(ToolResult::failure(err.payload()))
            }
            Err(err) => {
                tracing::warn!(
                    tool = name,
                    kind = err.kind(),
                    elapsed_ms,
                    error = %err,
                    "tool call aborted"
                );
                Err(err)
            }
        }
    }

    async fn invoke(
        &self,
        cancel: &CancellationToken,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResult, ToolError> {
        let handler = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool {
                name: name.to_string(),
            })?;
        let account = self.accounts.get_current().await?;
        tracing::debug!(tool = name, account = account.name(), "dispatching tool call");

        let args = Arguments::from_value(arguments)?;
        handler.call(cancel, &args, &account).await
    }
}
