use clap::{Parser, Subcommand};
use linodemcp_core::LoggingConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{DEFAULT_CONFIG, serve::ServeArgs, tools::ToolsArgs};

#[derive(Parser, Debug)]
#[command(name = "linodemcp", version, about = "MCP server for the Linode cloud API")]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG, env = "LINODEMCP_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP server.
    Serve(ServeArgs),

    /// Print the tool catalog.
    Tools(ToolsArgs),

    /// Validate the configuration and build every account's client offline.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(&cli.config)?;
    init_tracing(&config.logging);

    match cli.cmd {
        Command::Serve(args) => commands::serve::run(config, args).await,
        Command::Tools(args) => commands::tools::run(args),
        Command::Check => commands::check::run(&cli.config, &config).await,
    }
}

/// Logs go to stderr; stdout belongs to the stdio transport.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(logging.ansi)
        .init();
}
