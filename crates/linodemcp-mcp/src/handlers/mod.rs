//! Tool handlers, one flat unit struct per tool.
//!
//! A handler decodes its arguments into a typed request, talks to the
//! upstream through the account's client (or its reference cache), and
//! renders the answer. Handlers never touch the account manager.

pub mod databases;
pub mod domains;
pub mod firewalls;
pub mod instances;
pub mod networking;
pub mod profile;
pub mod reference;
pub mod stackscripts;

use crate::accounts::Account;
use crate::arguments::Arguments;
use crate::error::ToolError;
use crate::protocol::{ToolAnnotations, ToolDefinition, ToolResult};
use crate::tools::InputSchema;
use async_trait::async_trait;
use linodemcp_client::UpstreamError;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// The contract every tool implements.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name, description and argument schema advertised by `tools/list`.
    fn definition(&self) -> ToolDefinition;

    /// Execute against `account`. Must stop issuing upstream calls once
    /// `cancel` fires.
    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError>;
}

/// Run one upstream call, abandoning it when `cancel` fires.
pub(crate) async fn upstream<T, F>(cancel: &CancellationToken, call: F) -> Result<T, ToolError>
where
    F: Future<Output = Result<T, UpstreamError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ToolError::Cancelled),
        result = call => result.map_err(ToolError::from),
    }
}

pub(crate) fn read_only(name: &str, description: &str, schema: InputSchema) -> ToolDefinition {
    definition(name, description, schema, ToolAnnotations::read_only())
}

pub(crate) fn mutating(
    name: &str,
    description: &str,
    schema: InputSchema,
    destructive: bool,
) -> ToolDefinition {
    definition(name, description, schema, ToolAnnotations::mutating(destructive))
}

fn definition(
    name: &str,
    description: &str,
    schema: InputSchema,
    annotations: ToolAnnotations,
) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: schema.build(),
        annotations: Some(annotations),
    }
}

/// Case-insensitive match of an optional filter against a value.
pub(crate) fn matches_filter(filter: Option<&str>, value: &str) -> bool {
    filter.is_none_or(|f| value.eq_ignore_ascii_case(f))
}
