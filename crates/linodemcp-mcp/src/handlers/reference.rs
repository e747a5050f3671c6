//! Reference catalogs served from the account's cache, plus cache control.

use super::{ToolHandler, matches_filter, mutating, read_only};
use crate::accounts::Account;
use crate::arguments::{ArgumentError, Arguments, FromArguments};
use crate::cache::{CacheCategory, CacheStats, SlotStats};
use crate::error::ToolError;
use crate::protocol::{ToolDefinition, ToolResult};
use crate::render::{Block, DetailItem, ListItem, render_detail, render_list, yes_no};
use crate::tools::{FieldKind, InputSchema};
use async_trait::async_trait;
use linodemcp_client::{InstanceType, Kernel, Region};
use tokio_util::sync::CancellationToken;

impl ListItem for Region {
    fn render_item(&self, block: &mut Block) {
        block
            .field("ID", &self.id)
            .field("Label", &self.label)
            .field("Country", &self.country)
            .field("Status", &self.status)
            .list("Capabilities", &self.capabilities);
    }
}

impl ListItem for InstanceType {
    fn render_item(&self, block: &mut Block) {
        block
            .field("ID", &self.id)
            .field("Label", &self.label)
            .field("Class", &self.class)
            .field("vCPUs", self.vcpus)
            .field("Memory", format!("{} MB", self.memory))
            .field("Disk", format!("{} MB", self.disk))
            .field("Transfer", format!("{} GB", self.transfer))
            .field(
                "Price",
                format!("${:.4}/hr, ${:.2}/mo", self.price.hourly, self.price.monthly),
            );
    }
}

impl ListItem for Kernel {
    fn render_item(&self, block: &mut Block) {
        block
            .field("ID", &self.id)
            .field("Label", &self.label)
            .field("Version", &self.version)
            .field("Architecture", &self.architecture)
            .field("KVM", yes_no(self.kvm))
            .field("Deprecated", yes_no(self.deprecated))
            .optional("Built", self.built.as_deref());
    }
}

struct CountryFilter {
    country: Option<String>,
}

impl FromArguments for CountryFilter {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            country: args.optional_string("country")?,
        })
    }
}

pub struct ListRegions;

#[async_trait]
impl ToolHandler for ListRegions {
    fn definition(&self) -> ToolDefinition {
        read_only(
            "linode.regions.list",
            "List datacenter regions",
            InputSchema::new().optional(
                "country",
                FieldKind::String,
                "Only regions in this country code, e.g. us",
            ),
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: CountryFilter = args.decode()?;
        let regions: Vec<_> = account
            .cache()
            .regions(account.client(), cancel)
            .await?
            .into_iter()
            .filter(|r| matches_filter(request.country.as_deref(), &r.country))
            .collect();
        Ok(ToolResult::text(render_list("regions", &regions)))
    }
}

struct ClassFilter {
    class: Option<String>,
}

impl FromArguments for ClassFilter {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            class: args.optional_string("class")?,
        })
    }
}

pub struct ListTypes;

#[async_trait]
impl ToolHandler for ListTypes {
    fn definition(&self) -> ToolDefinition {
        read_only(
            "linode.types.list",
            "List instance types (plans) with pricing",
            InputSchema::new().optional(
                "class",
                FieldKind::String,
                "Only types of this class, e.g. standard, dedicated, nanode",
            ),
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: ClassFilter = args.decode()?;
        let types: Vec<_> = account
            .cache()
            .types(account.client(), cancel)
            .await?
            .into_iter()
            .filter(|t| matches_filter(request.class.as_deref(), &t.class))
            .collect();
        Ok(ToolResult::text(render_list("instance types", &types)))
    }
}

struct ArchitectureFilter {
    architecture: Option<String>,
}

impl FromArguments for ArchitectureFilter {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            architecture: args.optional_string("architecture")?,
        })
    }
}

pub struct ListKernels;

#[async_trait]
impl ToolHandler for ListKernels {
    fn definition(&self) -> ToolDefinition {
        read_only(
            "linode.kernels.list",
            "List bootable kernels",
            InputSchema::new().optional(
                "architecture",
                FieldKind::String,
                "Only kernels for this architecture, e.g. x86_64",
            ),
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: ArchitectureFilter = args.decode()?;
        let kernels: Vec<_> = account
            .cache()
            .kernels(account.client(), cancel)
            .await?
            .into_iter()
            .filter(|k| matches_filter(request.architecture.as_deref(), &k.architecture))
            .collect();
        Ok(ToolResult::text(render_list("kernels", &kernels)))
    }
}

struct StatsView(CacheStats);

fn slot_summary(slot: SlotStats) -> String {
    if !slot.present {
        return "empty".to_string();
    }
    let freshness = if slot.expired { "expired" } else { "fresh" };
    format!("{} items, {freshness}", slot.count)
}

impl DetailItem for StatsView {
    const CATEGORY: &'static str = "Reference Cache";

    fn render_detail(&self, block: &mut Block) {
        block
            .field("TTL", format!("{:?}", self.0.ttl))
            .field("Regions", slot_summary(self.0.regions))
            .field("Types", slot_summary(self.0.types))
            .field("Kernels", slot_summary(self.0.kernels));
    }
}

pub struct CacheStatsTool;

#[async_trait]
impl ToolHandler for CacheStatsTool {
    fn definition(&self) -> ToolDefinition {
        read_only(
            "linode.cache.stats",
            "Show the state of the reference-data cache for the current account",
            InputSchema::new(),
        )
    }

    async fn call(
        &self,
        _cancel: &CancellationToken,
        _args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let stats = account.cache().stats().await;
        Ok(ToolResult::text(render_detail(&StatsView(stats))))
    }
}

const CATEGORIES: [&str; 3] = ["regions", "types", "kernels"];

#[derive(Debug)]
struct InvalidateRequest {
    category: Option<CacheCategory>,
}

impl FromArguments for InvalidateRequest {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        let category = args
            .one_of("category", &CATEGORIES)?
            .map(|name| {
                name.parse::<CacheCategory>()
                    .map_err(|reason| ArgumentError::out_of_range("category", reason))
            })
            .transpose()?;
        Ok(Self { category })
    }
}

pub struct CacheInvalidateTool;

#[async_trait]
impl ToolHandler for CacheInvalidateTool {
    fn definition(&self) -> ToolDefinition {
        mutating(
            "linode.cache.invalidate",
            "Drop cached reference data so the next read refetches it",
            InputSchema::new().optional(
                "category",
                FieldKind::Enum(&CATEGORIES),
                "Category to drop; all categories when omitted",
            ),
            false,
        )
    }

    async fn call(
        &self,
        _cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: InvalidateRequest = args.decode()?;
        let text = match request.category {
            Some(category) => {
                account.cache().invalidate(category).await;
                format!("Invalidated reference cache: {category}")
            }
            None => {
                account.cache().invalidate_all().await;
                "Invalidated reference cache: all categories".to_string()
            }
        };
        Ok(ToolResult::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linodemcp_client::Price;

    #[test]
    fn test_type_rendering() {
        let plan = InstanceType {
            id: "g6-nanode-1".into(),
            label: "Nanode 1GB".into(),
            class: "nanode".into(),
            vcpus: 1,
            memory: 1024,
            disk: 25600,
            transfer: 1000,
            price: Price {
                hourly: 0.0075,
                monthly: 5.0,
            },
        };
        let text = render_list("instance types", &[plan]);
        assert!(text.starts_with("Found 1 instance types:\n\nID: g6-nanode-1\n"));
        assert!(text.contains("Price: $0.0075/hr, $5.00/mo"));
    }

    #[test]
    fn test_invalidate_request_rejects_unknown_category() {
        let args = Arguments::from_value(serde_json::json!({"category": "images"})).unwrap();
        let err = args.decode::<InvalidateRequest>().err().unwrap();
        assert_eq!(err.field, "category");
        assert_eq!(err.reason.code(), "out_of_range");
    }

    #[test]
    fn test_invalidate_request_category_ignores_case() {
        let args = Arguments::from_value(serde_json::json!({"category": "Regions"})).unwrap();
        let request = args.decode::<InvalidateRequest>().unwrap();
        assert_eq!(request.category, Some(CacheCategory::Regions));

        let args = Arguments::from_value(serde_json::json!({})).unwrap();
        assert_eq!(args.decode::<InvalidateRequest>().unwrap().category, None);
    }

    #[test]
    fn test_stats_view() {
        let view = StatsView(CacheStats {
            ttl: std::time::Duration::from_secs(300),
            regions: SlotStats {
                present: true,
                count: 2,
                expired: false,
            },
            types: SlotStats {
                present: false,
                count: 0,
                expired: false,
            },
            kernels: SlotStats {
                present: true,
                count: 4,
                expired: true,
            },
        });
        assert_eq!(
            render_detail(&view),
            "Reference Cache Details:\nTTL: 300s\nRegions: 2 items, fresh\nTypes: empty\nKernels: 4 items, expired"
        );
    }
}
