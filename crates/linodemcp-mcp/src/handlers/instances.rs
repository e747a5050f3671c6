//! Compute instance tools.

use super::{ToolHandler, matches_filter, mutating, read_only, upstream};
use crate::accounts::Account;
use crate::arguments::{ArgumentError, Arguments, FromArguments};
use crate::error::ToolError;
use crate::protocol::{ToolDefinition, ToolResult};
use crate::render::{Block, DetailItem, ListItem, render_detail, render_list};
use crate::tools::{FieldKind, InputSchema};
use async_trait::async_trait;
use linodemcp_client::{CreateInstanceRequest, Instance, InstanceApi};
use tokio_util::sync::CancellationToken;

impl ListItem for Instance {
    fn render_item(&self, block: &mut Block) {
        block
            .field("ID", self.id)
            .field("Label", &self.label)
            .field("Status", &self.status)
            .field("Region", &self.region)
            .optional("Type", self.instance_type.as_deref())
            .optional("Image", self.image.as_deref())
            .list("IPv4", &self.ipv4);
    }
}

impl DetailItem for Instance {
    const CATEGORY: &'static str = "Instance";

    fn render_detail(&self, block: &mut Block) {
        block
            .field("ID", self.id)
            .field("Label", &self.label)
            .field("Status", &self.status)
            .field("Region", &self.region)
            .optional("Type", self.instance_type.as_deref())
            .optional("Image", self.image.as_deref())
            .optional("Hypervisor", self.hypervisor.as_deref())
            .list("IPv4", &self.ipv4)
            .optional("IPv6", self.ipv6.as_deref())
            .list("Tags", &self.tags);
        if let Some(specs) = &self.specs {
            block.section(
                "Specs",
                [
                    format!("vCPUs: {}", specs.vcpus),
                    format!("Memory: {} MB", specs.memory),
                    format!("Disk: {} MB", specs.disk),
                    format!("Transfer: {} GB", specs.transfer),
                ],
            );
        }
        block
            .field("Created", &self.created)
            .field("Updated", &self.updated);
    }
}

fn id_schema() -> InputSchema {
    InputSchema::new().required("linode_id", FieldKind::Integer, "ID of the instance")
}

struct InstanceId {
    linode_id: u64,
}

impl FromArguments for InstanceId {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            linode_id: args.required_id("linode_id")?,
        })
    }
}

struct StatusFilter {
    status: Option<String>,
}

impl FromArguments for StatusFilter {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            status: args.optional_string("status")?,
        })
    }
}

pub struct ListInstances;

#[async_trait]
impl ToolHandler for ListInstances {
    fn definition(&self) -> ToolDefinition {
        read_only(
            "linode.instances.list",
            "List compute instances",
            InputSchema::new().optional(
                "status",
                FieldKind::String,
                "Only instances in this status, e.g. running or offline",
            ),
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: StatusFilter = args.decode()?;
        let instances: Vec<_> = upstream(cancel, account.client().list_instances())
            .await?
            .into_iter()
            .filter(|i| matches_filter(request.status.as_deref(), &i.status))
            .collect();
        Ok(ToolResult::text(render_list("instances", &instances)))
    }
}

pub struct GetInstance;

#[async_trait]
impl ToolHandler for GetInstance {
    fn definition(&self) -> ToolDefinition {
        read_only(
            "linode.instances.get",
            "Show one compute instance",
            id_schema(),
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: InstanceId = args.decode()?;
        let instance = upstream(cancel, account.client().get_instance(request.linode_id)).await?;
        Ok(ToolResult::text(render_detail(&instance)))
    }
}

impl FromArguments for CreateInstanceRequest {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            region: args.required_string("region")?,
            instance_type: args.required_string("type")?,
            label: args.required_string("label")?,
            image: args.optional_string("image")?,
            root_pass: args.optional_string("root_pass")?,
            authorized_keys: args.string_list("authorized_keys")?,
            tags: args.string_list("tags")?,
            booted: args.optional_bool("booted")?,
            private_ip: args.optional_bool("private_ip")?,
        })
    }
}

pub struct CreateInstance;

#[async_trait]
impl ToolHandler for CreateInstance {
    fn definition(&self) -> ToolDefinition {
        mutating(
            "linode.instances.create",
            "Create a compute instance",
            InputSchema::new()
                .required("region", FieldKind::String, "Region ID, e.g. us-east")
                .required("type", FieldKind::String, "Instance type ID, e.g. g6-nanode-1")
                .required("label", FieldKind::String, "Label for the new instance")
                .optional("image", FieldKind::String, "Image ID to deploy, e.g. linode/debian12")
                .optional("root_pass", FieldKind::String, "Root password (required with image)")
                .optional("authorized_keys", FieldKind::StringArray, "SSH public keys for root")
                .optional("tags", FieldKind::StringArray, "Tags to apply")
                .optional("booted", FieldKind::Boolean, "Boot after creation")
                .optional("private_ip", FieldKind::Boolean, "Allocate a private IPv4 address"),
            false,
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: CreateInstanceRequest = args.decode()?;

        let regions = account.cache().regions(account.client(), cancel).await?;
        if !regions.iter().any(|r| r.id == request.region) {
            return Err(ArgumentError::out_of_range(
                "region",
                format!("'{}' is not an available region", request.region),
            )
            .into());
        }
        let types = account.cache().types(account.client(), cancel).await?;
        if !types.iter().any(|t| t.id == request.instance_type) {
            return Err(ArgumentError::out_of_range(
                "type",
                format!("'{}' is not an available instance type", request.instance_type),
            )
            .into());
        }

        let created = upstream(cancel, account.client().create_instance(&request)).await?;
        tracing::info!(account = account.name(), linode_id = created.id, "instance created");
        Ok(ToolResult::text(render_detail(&created)))
    }
}

pub struct DeleteInstance;

#[async_trait]
impl ToolHandler for DeleteInstance {
    fn definition(&self) -> ToolDefinition {
        mutating(
            "linode.instances.delete",
            "Delete a compute instance and all of its disks",
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
        let request: InstanceId = args.decode()?;
        upstream(cancel, account.client().delete_instance(request.linode_id)).await?;
        Ok(ToolResult::text(format!("Instance {} deleted.", request.linode_id)))
    }
}

struct PowerRequest {
    linode_id: u64,
    config_id: u64,
}

impl PowerRequest {
    fn config(&self) -> Option<u64> {
        (self.config_id > 0).then_some(self.config_id)
    }

    fn describe(&self, action: &str) -> String {
        match self.config() {
            Some(config) => format!(
                "Instance {} {action} requested (config {config}).",
                self.linode_id
            ),
            None => format!("Instance {} {action} requested.", self.linode_id),
        }
    }
}

impl FromArguments for PowerRequest {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            linode_id: args.required_id("linode_id")?,
            config_id: args.optional_id("config_id")?,
        })
    }
}

fn power_schema() -> InputSchema {
    id_schema().optional(
        "config_id",
        FieldKind::Integer,
        "Config profile to boot with; the last used one when omitted",
    )
}

pub struct BootInstance;

#[async_trait]
impl ToolHandler for BootInstance {
    fn definition(&self) -> ToolDefinition {
        mutating(
            "linode.instances.boot",
            "Boot a compute instance",
            power_schema(),
            false,
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: PowerRequest = args.decode()?;
        upstream(
            cancel,
            account
                .client()
                .boot_instance(request.linode_id, request.config()),
        )
        .await?;
        Ok(ToolResult::text(request.describe("boot")))
    }
}

pub struct RebootInstance;

#[async_trait]
impl ToolHandler for RebootInstance {
    fn definition(&self) -> ToolDefinition {
        mutating(
            "linode.instances.reboot",
            "Reboot a compute instance",
            power_schema(),
            false,
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: PowerRequest = args.decode()?;
        upstream(
            cancel,
            account
                .client()
                .reboot_instance(request.linode_id, request.config()),
        )
        .await?;
        Ok(ToolResult::text(request.describe("reboot")))
    }
}

pub struct ShutdownInstance;

#[async_trait]
impl ToolHandler for ShutdownInstance {
    fn definition(&self) -> ToolDefinition {
        mutating(
            "linode.instances.shutdown",
            "Shut down a running compute instance",
            id_schema(),
            false,
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: InstanceId = args.decode()?;
        upstream(
            cancel,
            account.client().shutdown_instance(request.linode_id),
        )
        .await?;
        Ok(ToolResult::text(format!(
            "Instance {} shutdown requested.",
            request.linode_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_decoding() {
        let args = Arguments::from_value(json!({
            "region": "us-east",
            "type": "g6-nanode-1",
            "label": "web",
            "tags": ["prod"],
            "image": "",
            "unknown": 1
        }))
        .unwrap();
        let request: CreateInstanceRequest = args.decode().unwrap();
        assert_eq!(request.label, "web");
        assert_eq!(request.tags, vec!["prod"]);
        assert_eq!(request.image, None);
        assert!(request.authorized_keys.is_empty());
    }

    #[test]
    fn test_create_request_requires_label() {
        let args = Arguments::from_value(json!({
            "region": "us-east",
            "type": "g6-nanode-1",
            "label": ""
        }))
        .unwrap();
        let err = args.decode::<CreateInstanceRequest>().unwrap_err();
        assert_eq!(err.field, "label");
        assert_eq!(err.reason.code(), "empty");
    }

    #[test]
    fn test_power_request_config() {
        let args = Arguments::from_value(json!({"linode_id": 101.0})).unwrap();
        let request: PowerRequest = args.decode().unwrap();
        assert_eq!(request.config(), None);
        assert_eq!(request.describe("boot"), "Instance 101 boot requested.");

        let args = Arguments::from_value(json!({"linode_id": 101, "config_id": 9})).unwrap();
        let request: PowerRequest = args.decode().unwrap();
        assert_eq!(request.describe("reboot"), "Instance 101 reboot requested (config 9).");
    }
}
