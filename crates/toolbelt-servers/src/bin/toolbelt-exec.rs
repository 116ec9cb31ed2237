//! Python execution MCP server binary.
//!
//! Spawns the backend probe before serving: the server accepts requests
//! immediately and reports backend state per-call while the probe runs.

use clap::Parser;
use std::sync::Arc;
use toolbelt_core::{init_telemetry, run_server, ServeArgs, ServerConfig, TelemetryConfig};
use toolbelt_sandbox::{BackendProbe, DockerSandbox, RecordStore, Sandbox, SandboxConfig};
use toolbelt_servers::ExecServer;

/// Default SSE port for the exec server.
const PORT_DEFAULT: u16 = 8000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServeArgs::parse();
    init_telemetry(&TelemetryConfig::new("toolbelt-exec").with_log_level(args.log_level()));

    let config = ServerConfig::from_env("toolbelt-exec", PORT_DEFAULT);
    config.validate()?;
    let base_dir = config.ensure_base_dir()?.to_path_buf();

    let scripts_dir = base_dir.join("python_files");
    std::fs::create_dir_all(&scripts_dir)?;
    let store = Arc::new(RecordStore::new(base_dir.join("output"))?);

    let sandbox_config = SandboxConfig::default();
    sandbox_config.validate()?;
    let sandbox: Arc<dyn Sandbox> = Arc::new(DockerSandbox::new(sandbox_config, &scripts_dir));

    let probe = BackendProbe::spawn(Arc::clone(&sandbox));
    let backend_status = probe.status_handle();

    run_server(&args, &config, move || {
        ExecServer::new(
            &scripts_dir,
            Arc::clone(&sandbox),
            Arc::clone(&store),
            Arc::clone(&backend_status),
        )
    })
    .await?;

    probe.shutdown().await;
    Ok(())
}
