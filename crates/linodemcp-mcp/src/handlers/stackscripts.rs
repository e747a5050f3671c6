//! StackScript tools.

use super::{ToolHandler, mutating, read_only, upstream};
use crate::accounts::Account;
use crate::arguments::{ArgumentError, ArgumentReason, Arguments, FromArguments};
use crate::error::ToolError;
use crate::protocol::{ToolDefinition, ToolResult};
use crate::render::{Block, DetailItem, ListItem, render_detail, render_list, visibility};
use crate::tools::{FieldKind, InputSchema};
use async_trait::async_trait;
use linodemcp_client::{CreateStackScriptRequest, StackScript, StackScriptApi};
use tokio_util::sync::CancellationToken;

impl ListItem for StackScript {
    fn render_item(&self, block: &mut Block) {
        block
            .field("ID", self.id)
            .field("Label", &self.label)
            .field("Owner", &self.username)
            .field("Visibility", visibility(self.is_public))
            .list("Images", &self.images)
            .field("Deployments", self.deployments_total)
            .field("Updated", &self.updated);
    }
}

impl DetailItem for StackScript {
    const CATEGORY: &'static str = "StackScript";

    fn render_detail(&self, block: &mut Block) {
        block
            .field("ID", self.id)
            .field("Label", &self.label)
            .field("Owner", &self.username)
            .field("Visibility", visibility(self.is_public))
            .optional("Description", self.description.as_deref())
            .list("Images", &self.images)
            .field("Deployments", self.deployments_total)
            .optional("Revision Note", self.rev_note.as_deref())
            .field("Created", &self.created)
            .field("Updated", &self.updated)
            .section(
                "Script",
                self.script
                    .iter()
                    .flat_map(|script| script.lines())
                    .map(str::to_string),
            );
    }
}

struct ListRequest {
    mine: bool,
}

impl FromArguments for ListRequest {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            mine: args.optional_bool("mine")?.unwrap_or(true),
        })
    }
}

pub struct ListStackScripts;

#[async_trait]
impl ToolHandler for ListStackScripts {
    fn definition(&self) -> ToolDefinition {
        read_only(
            "linode.stackscripts.list",
            "List StackScripts",
            InputSchema::new().optional(
                "mine",
                FieldKind::Boolean,
                "Only your own StackScripts; defaults to true",
            ),
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: ListRequest = args.decode()?;
        let scripts = upstream(cancel, account.client().list_stackscripts(request.mine)).await?;
        Ok(ToolResult::text(render_list("StackScripts", &scripts)))
    }
}

struct StackScriptId {
    stackscript_id: u64,
}

impl FromArguments for StackScriptId {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            stackscript_id: args.required_id("stackscript_id")?,
        })
    }
}

fn id_schema() -> InputSchema {
    InputSchema::new().required("stackscript_id", FieldKind::Integer, "ID of the StackScript")
}

pub struct GetStackScript;

#[async_trait]
impl ToolHandler for GetStackScript {
    fn definition(&self) -> ToolDefinition {
        read_only(
            "linode.stackscripts.get",
            "Show one StackScript including its script body",
            id_schema(),
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: StackScriptId = args.decode()?;
        let script = upstream(
            cancel,
            account.client().get_stackscript(request.stackscript_id),
        )
        .await?;
        Ok(ToolResult::text(render_detail(&script)))
    }
}

impl FromArguments for CreateStackScriptRequest {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        let label = args.required_string("label")?;
        let script = args.required_string("script")?;
        let images = args.string_list("images")?;
        if images.is_empty() {
            return Err(ArgumentError::new("images", ArgumentReason::EmptyWhenRequired));
        }
        Ok(Self {
            label,
            script,
            images,
            description: args.optional_string("description")?,
            is_public: args.optional_bool("is_public")?,
            rev_note: args.optional_string("rev_note")?,
        })
    }
}

pub struct CreateStackScript;

#[async_trait]
impl ToolHandler for CreateStackScript {
    fn definition(&self) -> ToolDefinition {
        mutating(
            "linode.stackscripts.create",
            "Create a StackScript",
            InputSchema::new()
                .required("label", FieldKind::String, "Label for the StackScript")
                .required("script", FieldKind::String, "Script body, starting with a shebang line")
                .required(
                    "images",
                    FieldKind::StringArray,
                    "Image IDs the script is compatible with",
                )
                .optional("description", FieldKind::String, "Free-form description")
                .optional(
                    "is_public",
                    FieldKind::Boolean,
                    "Publish the StackScript; private when omitted",
                )
                .optional("rev_note", FieldKind::String, "Revision note"),
            false,
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: CreateStackScriptRequest = args.decode()?;
        let created = upstream(cancel, account.client().create_stackscript(&request)).await?;
        tracing::info!(
            account = account.name(),
            stackscript_id = created.id,
            "stackscript created"
        );
        Ok(ToolResult::text(render_detail(&created)))
    }
}

pub struct DeleteStackScript;

#[async_trait]
impl ToolHandler for DeleteStackScript {
    fn definition(&self) -> ToolDefinition {
        mutating(
            "linode.stackscripts.delete",
            "Delete a StackScript",
            id_schema(),
            true,
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: StackScriptId = args.decode()?;
        upstream(
            cancel,
            account.client().delete_stackscript(request.stackscript_id),
        )
        .await?;
        Ok(ToolResult::text(format!(
            "StackScript {} deleted.",
            request.stackscript_id
        )))
    }
}
