//! GitHub MCP server binary.

use clap::Parser;
use toolbelt_core::{init_telemetry, run_server, ServeArgs, ServerConfig, TelemetryConfig};
use toolbelt_servers::GithubServer;
use tracing::warn;

/// Default SSE port for the GitHub server.
const PORT_DEFAULT: u16 = 8003;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServeArgs::parse();
    init_telemetry(&TelemetryConfig::new("toolbelt-github").with_log_level(args.log_level()));

    let config = ServerConfig::from_env("toolbelt-github", PORT_DEFAULT);
    config.validate()?;

    let token = std::env::var(toolbelt_servers::github::ENV_GITHUB_TOKEN).ok();
    if token.is_none() {
        warn!("GITHUB_TOKEN is not set; all tools will report not-initialized");
    }

    run_server(&args, &config, move || GithubServer::new(token.clone())).await
}
