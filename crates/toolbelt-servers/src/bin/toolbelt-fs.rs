//! Filesystem MCP server binary.

use clap::Parser;
use toolbelt_core::{init_telemetry, run_server, ServeArgs, ServerConfig, TelemetryConfig};
use toolbelt_servers::FsServer;

/// Default SSE port for the filesystem server.
const PORT_DEFAULT: u16 = 8001;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServeArgs::parse();
    init_telemetry(&TelemetryConfig::new("toolbelt-fs").with_log_level(args.log_level()));

    let config = ServerConfig::from_env("toolbelt-fs", PORT_DEFAULT);
    config.validate()?;
    let base_dir = config.ensure_base_dir()?.to_path_buf();

    run_server(&args, &config, move || FsServer::new(&base_dir)).await
}
