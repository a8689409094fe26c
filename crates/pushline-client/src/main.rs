//! Pushline CLI
//!
//! Operator commands against the subscription registry.

use clap::Parser;
use tracing::debug;

use pushline_client::commands::{self, Command};
use pushline_core::config::{KeyPolicy, load_config};
use pushline_core::tracing_init::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "pushline")]
#[command(version, about = "Web push subscription registry tool", long_about = None)]
struct Cli {
    /// Registry base URL
    #[arg(long, env = "PUSHLINE_BASE_URL")]
    base_url: Option<String>,

    /// Bearer token for the registry
    #[arg(long, env = "PUSHLINE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Application server key policy: lenient or strict
    #[arg(long, env = "PUSHLINE_KEY_POLICY")]
    key_policy: Option<KeyPolicy>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().ok();
    let mut config = load_config(cwd.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.registry.base_url = base_url;
    }
    if let Some(token) = cli.token {
        config.registry.token = Some(token);
    }
    if let Some(policy) = cli.key_policy {
        config.keys.policy = policy;
    }

    let filter = format!("pushline={}", config.logging.level);
    init_tracing(&filter, cli.log_json || config.logging.json);
    debug!(base_url = %config.registry.base_url, "Resolved configuration");

    commands::run(cli.command, &config).await
}
