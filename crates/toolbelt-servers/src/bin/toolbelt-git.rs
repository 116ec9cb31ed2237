//! Git MCP server binary.

use clap::Parser;
use toolbelt_core::{init_telemetry, run_server, ServeArgs, ServerConfig, TelemetryConfig};
use toolbelt_servers::GitServer;

/// Default SSE port for the git server.
const PORT_DEFAULT: u16 = 8004;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServeArgs::parse();
    init_telemetry(&TelemetryConfig::new("toolbelt-git").with_log_level(args.log_level()));

    // The base directory is the repository root.
    let config = ServerConfig::from_env("toolbelt-git", PORT_DEFAULT);
    config.validate()?;
    let repo_root = config.ensure_base_dir()?.to_path_buf();

    run_server(&args, &config, move || GitServer::new(&repo_root)).await
}
