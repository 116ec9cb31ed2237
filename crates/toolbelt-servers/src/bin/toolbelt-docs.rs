//! Documentation lookup MCP server binary.

use clap::Parser;
use toolbelt_core::{init_telemetry, run_server, ServeArgs, ServerConfig, TelemetryConfig};
use toolbelt_servers::DocsServer;

/// Default SSE port for the docs server.
const PORT_DEFAULT: u16 = 8005;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServeArgs::parse();
    init_telemetry(&TelemetryConfig::new("toolbelt-docs").with_log_level(args.log_level()));

    // The base directory is the document tree.
    let config = ServerConfig::from_env("toolbelt-docs", PORT_DEFAULT);
    config.validate()?;
    let docs_dir = config.ensure_base_dir()?.to_path_buf();

    run_server(&args, &config, move || DocsServer::new(&docs_dir)).await
}
