//! `linodemcp tools`: print the tool catalog without contacting the upstream.

use anyhow::{Context, Result};
use clap::Args;
use linodemcp_mcp::{ToolDefinition, default_registry};

/// Arguments for `linodemcp tools`.
#[derive(Debug, Args)]
pub struct ToolsArgs {
    /// Print the `tools/list` payload as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ToolsArgs) -> Result<()> {
    let tools = default_registry()
        .context("Failed to build tool catalog")?
        .definitions();

    if args.json {
        let payload = serde_json::json!({ "tools": tools });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print!("{}", render(&tools));
    }
    Ok(())
}

fn badge(tool: &ToolDefinition) -> &'static str {
    match &tool.annotations {
        Some(a) if a.read_only == Some(true) => "read",
        Some(a) if a.destructive == Some(true) => "destructive",
        _ => "write",
    }
}

fn render(tools: &[ToolDefinition]) -> String {
    let width = tools.iter().map(|t| t.name.len()).max().unwrap_or(0);
    let mut out = format!("Available tools ({}):\n", tools.len());
    for tool in tools {
        out.push_str(&format!(
            "  {:<width$}  [{}] {}\n",
            tool.name,
            badge(tool),
            tool.description.as_deref().unwrap_or(""),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_every_tool() {
        let tools = default_registry().unwrap().definitions();
        let text = render(&tools);
        assert!(text.starts_with("Available tools (30):\n"));
        assert_eq!(text.lines().count(), 31);
        assert!(text.contains("[destructive]"));
        let delete = text
            .lines()
            .find(|l| l.contains("linode.instances.delete "))
            .unwrap();
        assert!(delete.contains("[destructive]"));
    }
}
