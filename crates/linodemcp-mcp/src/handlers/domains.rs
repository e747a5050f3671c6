//! DNS zone tools.

use super::{ToolHandler, mutating, read_only, upstream};
use crate::accounts::Account;
use crate::arguments::{ArgumentError, Arguments, FromArguments};
use crate::error::ToolError;
use crate::protocol::{ToolDefinition, ToolResult};
use crate::render::{Block, DetailItem, ListItem, render_detail, render_list};
use crate::tools::{FieldKind, InputSchema};
use async_trait::async_trait;
use linodemcp_client::{CreateDomainRequest, Domain, DomainApi, DomainRecord};
use tokio_util::sync::CancellationToken;

impl ListItem for Domain {
    fn render_item(&self, block: &mut Block) {
        block
            .field("ID", self.id)
            .field("Domain", &self.domain)
            .field("Type", &self.domain_type)
            .field("Status", &self.status);
    }
}

impl DetailItem for Domain {
    const CATEGORY: &'static str = "Domain";

    fn render_detail(&self, block: &mut Block) {
        block
            .field("ID", self.id)
            .field("Domain", &self.domain)
            .field("Type", &self.domain_type)
            .field("Status", &self.status)
            .optional("SOA Email", self.soa_email.as_deref())
            .optional("Description", self.description.as_deref())
            .optional("TTL", (self.ttl_sec > 0).then_some(self.ttl_sec))
            .list("Tags", &self.tags)
            .field("Created", &self.created)
            .field("Updated", &self.updated);
    }
}

impl ListItem for DomainRecord {
    fn render_item(&self, block: &mut Block) {
        block
            .field("ID", self.id)
            .field("Type", &self.record_type)
            .field("Name", if self.name.is_empty() { "@" } else { self.name.as_str() })
            .field("Target", &self.target);
        if self.priority > 0 {
            block.field("Priority", self.priority);
        }
        if self.port > 0 {
            block.field("Weight", self.weight).field("Port", self.port);
        }
        if self.ttl_sec > 0 {
            block.field("TTL", self.ttl_sec);
        }
    }
}

struct DomainId {
    domain_id: u64,
}

impl FromArguments for DomainId {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            domain_id: args.required_id("domain_id")?,
        })
    }
}

fn id_schema() -> InputSchema {
    InputSchema::new().required("domain_id", FieldKind::Integer, "ID of the domain")
}

pub struct ListDomains;

#[async_trait]
impl ToolHandler for ListDomains {
    fn definition(&self) -> ToolDefinition {
        read_only("linode.domains.list", "List DNS domains", InputSchema::new())
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        _args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let domains = upstream(cancel, account.client().list_domains()).await?;
        Ok(ToolResult::text(render_list("domains", &domains)))
    }
}

pub struct GetDomain;

#[async_trait]
impl ToolHandler for GetDomain {
    fn definition(&self) -> ToolDefinition {
        read_only("linode.domains.get", "Show one DNS domain", id_schema())
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: DomainId = args.decode()?;
        let domain = upstream(cancel, account.client().get_domain(request.domain_id)).await?;
        Ok(ToolResult::text(render_detail(&domain)))
    }
}

impl FromArguments for CreateDomainRequest {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        let domain = args.required_string("domain")?;
        let domain_type = args
            .one_of("type", &["master", "slave"])?
            .unwrap_or_else(|| "master".to_string());
        let soa_email = args.optional_string("soa_email")?;
        if domain_type == "master" && soa_email.is_none() {
            return Err(ArgumentError::missing("soa_email"));
        }
        Ok(Self {
            domain,
            domain_type,
            soa_email,
            description: args.optional_string("description")?,
            tags: args.string_list("tags")?,
        })
    }
}

pub struct CreateDomain;

#[async_trait]
impl ToolHandler for CreateDomain {
    fn definition(&self) -> ToolDefinition {
        mutating(
            "linode.domains.create",
            "Create a DNS domain",
            InputSchema::new()
                .required("domain", FieldKind::String, "Domain name, e.g. example.com")
                .optional(
                    "type",
                    FieldKind::Enum(&["master", "slave"]),
                    "Zone type; defaults to master",
                )
                .optional(
                    "soa_email",
                    FieldKind::String,
                    "SOA contact email (required for master zones)",
                )
                .optional("description", FieldKind::String, "Free-form description")
                .optional("tags", FieldKind::StringArray, "Tags to apply"),
            false,
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: CreateDomainRequest = args.decode()?;
        let created = upstream(cancel, account.client().create_domain(&request)).await?;
        tracing::info!(account = account.name(), domain_id = created.id, "domain created");
        Ok(ToolResult::text(render_detail(&created)))
    }
}

pub struct DeleteDomain;

#[async_trait]
impl ToolHandler for DeleteDomain {
    fn definition(&self) -> ToolDefinition {
        mutating(
            "linode.domains.delete",
            "Delete a DNS domain and all of its records",
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
        let request: DomainId = args.decode()?;
        upstream(cancel, account.client().delete_domain(request.domain_id)).await?;
        Ok(ToolResult::text(format!("Domain {} deleted.", request.domain_id)))
    }
}

pub struct ListDomainRecords;

#[async_trait]
impl ToolHandler for ListDomainRecords {
    fn definition(&self) -> ToolDefinition {
        read_only(
            "linode.domains.records.list",
            "List the records of a DNS domain",
            id_schema(),
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: DomainId = args.decode()?;
        let records = upstream(
            cancel,
            account.client().list_domain_records(request.domain_id),
        )
        .await?;
        Ok(ToolResult::text(render_list("domain records", &records)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_master_zone_requires_soa_email() {
        let args = Arguments::from_value(json!({"domain": "example.com"})).unwrap();
        let err = args.decode::<CreateDomainRequest>().unwrap_err();
        assert_eq!(err.field, "soa_email");

        let args =
            Arguments::from_value(json!({"domain": "example.com", "type": "slave"})).unwrap();
        assert!(args.decode::<CreateDomainRequest>().is_ok());
    }

    #[test]
    fn test_record_rendering() {
        let record = DomainRecord {
            id: 1,
            record_type: "MX".into(),
            name: String::new(),
            target: "mail.example.com".into(),
            priority: 10,
            weight: 0,
            port: 0,
            ttl_sec: 0,
        };
        assert_eq!(
            render_list("domain records", &[record]),
            "Found 1 domain records:\n\nID: 1\nType: MX\nName: @\nTarget: mail.example.com\nPriority: 10"
        );
    }
}
