//! IP address and VPC listings.

use super::{ToolHandler, read_only, upstream};
use crate::accounts::Account;
use crate::arguments::Arguments;
use crate::error::ToolError;
use crate::protocol::{ToolDefinition, ToolResult};
use crate::render::{Block, ListItem, owner, render_list, visibility};
use crate::tools::InputSchema;
use async_trait::async_trait;
use linodemcp_client::{IpAddress, NetworkingApi, Vpc};
use tokio_util::sync::CancellationToken;

impl ListItem for IpAddress {
    fn render_item(&self, block: &mut Block) {
        block
            .field("Address", &self.address)
            .field("Type", &self.address_type)
            .field("Visibility", visibility(self.public))
            .field("Linode", owner(self.linode_id))
            .field("Region", &self.region)
            .optional("Gateway", self.gateway.as_deref())
            .optional("Prefix", (self.prefix > 0).then_some(self.prefix))
            .optional("RDNS", self.rdns.as_deref());
    }
}

impl ListItem for Vpc {
    fn render_item(&self, block: &mut Block) {
        block
            .field("ID", self.id)
            .field("Label", &self.label)
            .field("Region", &self.region)
            .optional("Description", self.description.as_deref())
            .section(
                "Subnets",
                self.subnets.iter().map(|subnet| match &subnet.ipv4 {
                    Some(range) => format!("{} {} ({range})", subnet.id, subnet.label),
                    None => format!("{} {}", subnet.id, subnet.label),
                }),
            )
            .field("Created", &self.created);
    }
}

pub struct ListIpAddresses;

#[async_trait]
impl ToolHandler for ListIpAddresses {
    fn definition(&self) -> ToolDefinition {
        read_only(
            "linode.ips.list",
            "List IP addresses on the account",
            InputSchema::new(),
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        _args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let ips = upstream(cancel, account.client().list_ip_addresses()).await?;
        Ok(ToolResult::text(render_list("IP addresses", &ips)))
    }
}

pub struct ListVpcs;

#[async_trait]
impl ToolHandler for ListVpcs {
    fn definition(&self) -> ToolDefinition {
        read_only("linode.vpcs.list", "List VPCs and their subnets", InputSchema::new())
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        _args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let vpcs = upstream(cancel, account.client().list_vpcs()).await?;
        Ok(ToolResult::text(render_list("VPCs", &vpcs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unassigned_private_address() {
        let ip = IpAddress {
            address: "192.168.128.5".into(),
            address_type: "ipv4".into(),
            public: false,
            linode_id: None,
            region: "us-east".into(),
            gateway: None,
            prefix: 17,
            rdns: None,
        };
        assert_eq!(
            render_list("IP addresses", &[ip]),
            "Found 1 IP addresses:\n\nAddress: 192.168.128.5\nType: ipv4\nVisibility: Private\nLinode: Unassigned\nRegion: us-east\nPrefix: 17"
        );
    }
}
