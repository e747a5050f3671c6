//! Cloud firewall tools.

use super::{ToolHandler, mutating, read_only, upstream};
use crate::accounts::Account;
use crate::arguments::{ArgumentError, Arguments, FromArguments};
use crate::error::ToolError;
use crate::protocol::{ToolDefinition, ToolResult};
use crate::render::{Block, DetailItem, ListItem, render_detail, render_list};
use crate::tools::{FieldKind, InputSchema};
use async_trait::async_trait;
use linodemcp_client::{
    CreateFirewallRequest, Firewall, FirewallAddresses, FirewallApi, FirewallRule, FirewallRules,
};
use tokio_util::sync::CancellationToken;

const ACTIONS: &[&str] = &["ACCEPT", "DROP"];
const PROTOCOLS: &[&str] = &["TCP", "UDP", "ICMP", "IPENCAP"];

fn rule_line(rule: &FirewallRule) -> String {
    let mut line = format!("{} {}", rule.action, rule.protocol);
    if let Some(ports) = &rule.ports {
        line.push_str(&format!(" ports {ports}"));
    }
    let addresses: Vec<&str> = rule
        .addresses
        .ipv4
        .iter()
        .chain(rule.addresses.ipv6.iter())
        .flatten()
        .map(String::as_str)
        .collect();
    if !addresses.is_empty() {
        line.push_str(&format!(" addresses {}", addresses.join(", ")));
    }
    if let Some(label) = &rule.label {
        line.push_str(&format!(" [{label}]"));
    }
    line
}

fn render_rules(block: &mut Block, rules: &FirewallRules) {
    block
        .field("Inbound Policy", &rules.inbound_policy)
        .section("Inbound Rules", rules.inbound.iter().map(rule_line))
        .field("Outbound Policy", &rules.outbound_policy)
        .section("Outbound Rules", rules.outbound.iter().map(rule_line));
}

impl ListItem for Firewall {
    fn render_item(&self, block: &mut Block) {
        block
            .field("ID", self.id)
            .field("Label", &self.label)
            .field("Status", &self.status)
            .field("Inbound Policy", &self.rules.inbound_policy)
            .field("Outbound Policy", &self.rules.outbound_policy)
            .field(
                "Rules",
                format!(
                    "{} inbound, {} outbound",
                    self.rules.inbound.len(),
                    self.rules.outbound.len()
                ),
            );
    }
}

impl DetailItem for Firewall {
    const CATEGORY: &'static str = "Firewall";

    fn render_detail(&self, block: &mut Block) {
        block
            .field("ID", self.id)
            .field("Label", &self.label)
            .field("Status", &self.status)
            .list("Tags", &self.tags);
        render_rules(block, &self.rules);
        block
            .field("Created", &self.created)
            .field("Updated", &self.updated);
    }
}

struct RulesView<'a> {
    firewall_id: u64,
    rules: &'a FirewallRules,
}

impl DetailItem for RulesView<'_> {
    const CATEGORY: &'static str = "Firewall Rules";

    fn render_detail(&self, block: &mut Block) {
        block.field("Firewall ID", self.firewall_id);
        render_rules(block, self.rules);
    }
}

fn decode_rule(args: &Arguments) -> Result<FirewallRule, ArgumentError> {
    let action = args.required_one_of("action", ACTIONS)?;
    let protocol = args.required_one_of("protocol", PROTOCOLS)?;
    let ports = args.optional_string("ports")?;
    let addresses = match args.object("addresses")? {
        Some(addresses) => FirewallAddresses {
            ipv4: addresses.optional_string_list("ipv4")?,
            ipv6: addresses.optional_string_list("ipv6")?,
        },
        None => FirewallAddresses::default(),
    };
    Ok(FirewallRule {
        action,
        protocol,
        ports,
        addresses,
        label: args.optional_string("label")?,
        description: args.optional_string("description")?,
    })
}

impl FromArguments for FirewallRules {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        let defaults = FirewallRules::default();
        Ok(Self {
            inbound_policy: args
                .one_of("inbound_policy", ACTIONS)?
                .unwrap_or(defaults.inbound_policy),
            outbound_policy: args
                .one_of("outbound_policy", ACTIONS)?
                .unwrap_or(defaults.outbound_policy),
            inbound: args
                .object_list("inbound")?
                .iter()
                .map(decode_rule)
                .collect::<Result<_, _>>()?,
            outbound: args
                .object_list("outbound")?
                .iter()
                .map(decode_rule)
                .collect::<Result<_, _>>()?,
        })
    }
}

fn rule_schema() -> InputSchema {
    let addresses = InputSchema::new()
        .optional("ipv4", FieldKind::StringArray, "IPv4 addresses or CIDR ranges")
        .optional("ipv6", FieldKind::StringArray, "IPv6 addresses or CIDR ranges");
    InputSchema::new()
        .required(
            "action",
            FieldKind::Enum(ACTIONS),
            "What to do with matching traffic",
        )
        .required("protocol", FieldKind::Enum(PROTOCOLS), "Protocol to match")
        .optional(
            "ports",
            FieldKind::String,
            "Ports or ranges, e.g. 22 or 80,443 or 8000-9000",
        )
        .optional("addresses", FieldKind::Object(addresses), "Addresses to match")
        .optional("label", FieldKind::String, "Rule label")
        .optional("description", FieldKind::String, "Rule description")
}

fn rules_schema() -> InputSchema {
    InputSchema::new()
        .optional(
            "inbound_policy",
            FieldKind::Enum(ACTIONS),
            "Default for inbound traffic; ACCEPT when omitted",
        )
        .optional(
            "outbound_policy",
            FieldKind::Enum(ACTIONS),
            "Default for outbound traffic; ACCEPT when omitted",
        )
        .optional("inbound", FieldKind::ObjectArray(rule_schema()), "Inbound rules")
        .optional("outbound", FieldKind::ObjectArray(rule_schema()), "Outbound rules")
}

struct FirewallId {
    firewall_id: u64,
}

impl FromArguments for FirewallId {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            firewall_id: args.required_id("firewall_id")?,
        })
    }
}

fn id_schema() -> InputSchema {
    InputSchema::new().required("firewall_id", FieldKind::Integer, "ID of the firewall")
}

pub struct ListFirewalls;

#[async_trait]
impl ToolHandler for ListFirewalls {
    fn definition(&self) -> ToolDefinition {
        read_only("linode.firewalls.list", "List cloud firewalls", InputSchema::new())
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        _args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let firewalls = upstream(cancel, account.client().list_firewalls()).await?;
        Ok(ToolResult::text(render_list("firewalls", &firewalls)))
    }
}

pub struct GetFirewall;

#[async_trait]
impl ToolHandler for GetFirewall {
    fn definition(&self) -> ToolDefinition {
        read_only(
            "linode.firewalls.get",
            "Show one cloud firewall with its rules",
            id_schema(),
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: FirewallId = args.decode()?;
        let firewall = upstream(cancel, account.client().get_firewall(request.firewall_id)).await?;
        Ok(ToolResult::text(render_detail(&firewall)))
    }
}

impl FromArguments for CreateFirewallRequest {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            label: args.required_string("label")?,
            rules: match args.object("rules")? {
                Some(rules) => rules.decode()?,
                None => FirewallRules::default(),
            },
            tags: args.string_list("tags")?,
        })
    }
}

pub struct CreateFirewall;

#[async_trait]
impl ToolHandler for CreateFirewall {
    fn definition(&self) -> ToolDefinition {
        mutating(
            "linode.firewalls.create",
            "Create a cloud firewall",
            InputSchema::new()
                .required("label", FieldKind::String, "Label for the new firewall")
                .optional(
                    "rules",
                    FieldKind::Object(rules_schema()),
                    "Initial rule set; accept-all when omitted",
                )
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
        let request: CreateFirewallRequest = args.decode()?;
        let created = upstream(cancel, account.client().create_firewall(&request)).await?;
        tracing::info!(
            account = account.name(),
            firewall_id = created.id,
            "firewall created"
        );
        Ok(ToolResult::text(render_detail(&created)))
    }
}

struct UpdateRulesRequest {
    firewall_id: u64,
    rules: FirewallRules,
}

impl FromArguments for UpdateRulesRequest {
    fn from_arguments(args: &Arguments) -> Result<Self, ArgumentError> {
        Ok(Self {
            firewall_id: args.required_id("firewall_id")?,
            rules: args.required_object("rules")?.decode()?,
        })
    }
}

pub struct UpdateFirewallRules;

#[async_trait]
impl ToolHandler for UpdateFirewallRules {
    fn definition(&self) -> ToolDefinition {
        mutating(
            "linode.firewalls.rules.update",
            "Replace the whole rule set of a cloud firewall",
            id_schema().required("rules", FieldKind::Object(rules_schema()), "The new rule set"),
            true,
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let request: UpdateRulesRequest = args.decode()?;
        let stored = upstream(
            cancel,
            account
                .client()
                .update_firewall_rules(request.firewall_id, &request.rules),
        )
        .await?;
        Ok(ToolResult::text(render_detail(&RulesView {
            firewall_id: request.firewall_id,
            rules: &stored,
        })))
    }
}

pub struct DeleteFirewall;

#[async_trait]
impl ToolHandler for DeleteFirewall {
    fn definition(&self) -> ToolDefinition {
        mutating(
            "linode.firewalls.delete",
            "Delete a cloud firewall",
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
        let request: FirewallId = args.decode()?;
        upstream(cancel, account.client().delete_firewall(request.firewall_id)).await?;
        Ok(ToolResult::text(format!(
            "Firewall {} deleted.",
            request.firewall_id
        )))
    }
}
