use super::{ToolHandler, matches_filter, read_only, upstream};
use crate::accounts::Account;
use crate::arguments::{ArgumentError, Arguments, FromArguments};
use crate::error::ToolError;
use crate::protocol::{ToolDefinition, ToolResult};
use crate::render::{Block, ListItem, render_list};
use crate::tools::{FieldKind, InputSchema};
use async_trait::async_trait;
use linodemcp_client::{Database, DatabaseApi};
use tokio_util::sync::CancellationToken;

impl ListItem for Database {
    fn render_item(&self, block: &mut Block) {
        block
            .field("ID", self.id)
            .field("Label", &self.label)
            .field("Engine", format!("{} {}", self.engine, self.version))
            .field("Region", &self.region)
            .field("Status", &self.status)
            .field("Type", &self.database_type)
            .field("Cluster Size", self.cluster_size)
            .optional("Primary Host", self.hosts.primary.as_deref())
            .optional("Secondary Host", self.hosts.secondary.as_deref())
            .field("Created", &self.created);
    }
}

struct EngineFilter {
    engine: Option<String>,
}

impl FromArguments for EngineFilter {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            engine: args.optional_string("engine")?,
        })
    }
}

pub struct ListDatabases;

#[async_trait]
impl ToolHandler for ListDatabases {
    fn definition(&self) -> ToolDefinition {
        read_only(
            "linode.databases.list",
            "List managed database clusters",
            InputSchema::new().optional(
                "engine",
                FieldKind::String,
                "Only clusters of this engine, e.g. mysql or postgresql",
            ),
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: EngineFilter = args.decode()?;
        let databases: Vec<_> = upstream(cancel, account.client().list_databases())
            .await?
            .into_iter()
            .filter(|d| matches_filter(request.engine.as_deref(), &d.engine))
            .collect();
        Ok(ToolResult::text(render_list("databases", &databases)))
    }
}
