//! Image generation MCP server binary.

use clap::Parser;
use toolbelt_core::{init_telemetry, run_server, ServeArgs, ServerConfig, TelemetryConfig};
use toolbelt_servers::{ImageGenConfig, ImageGenServer};

/// Default SSE port for the image generation server.
const PORT_DEFAULT: u16 = 8002;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServeArgs::parse();
    init_telemetry(&TelemetryConfig::new("toolbelt-imagegen").with_log_level(args.log_level()));

    let config = ServerConfig::from_env("toolbelt-imagegen", PORT_DEFAULT);
    config.validate()?;
    let base_dir = config.ensure_base_dir()?.to_path_buf();

    let gen_config = ImageGenConfig::from_env(base_dir.join("sd_output"));
    gen_config.validate()?;

    run_server(&args, &config, move || {
        ImageGenServer::new(gen_config.clone())
    })
    .await
}
