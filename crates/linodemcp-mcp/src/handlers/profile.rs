use super::{ToolHandler, read_only, upstream};
use crate::accounts::Account;
use crate::arguments::Arguments;
use crate::error::ToolError;
use crate::protocol::{ToolDefinition, ToolResult};
use crate::render::{Block, DetailItem, render_detail, yes_no};
use crate::tools::InputSchema;
use async_trait::async_trait;
use linodemcp_client::{Profile, ProfileApi};
use tokio_util::sync::CancellationToken;

impl DetailItem for Profile {
    const CATEGORY: &'static str = "Profile";

    fn render_detail(&self, block: &mut Block) {
        block
            .field("Username", &self.username)
            .field("Email", &self.email)
            .field("Timezone", &self.timezone)
            .field("Restricted", yes_no(self.restricted))
            .field("Two-Factor Auth", yes_no(self.two_factor_auth));
    }
}

/// Profile of the user behind the current account's token.
pub struct GetProfile;

#[async_trait]
impl ToolHandler for GetProfile {
    fn definition(&self) -> ToolDefinition {
        read_only(
            "linode.profile.get",
            "Show the profile of the user owning the current account's token",
            InputSchema::new(),
        )
    }

    async fn call(
        &self,
        cancel: &CancellationToken,
        _args: &Arguments,
        account: &Account,
    ) -> Result<ToolResult, ToolError> {
        let profile = upstream(cancel, account.client().get_profile()).await?;
        let mut text = render_detail(&profile);
        text.push_str(&format!("\nAccount: {} ({})", account.label(), account.name()));
        Ok(ToolResult::text(text))
    }
}
