//! Python execution MCP server
//!
//! Stages caller-supplied source under a scripts directory, runs it through
//! the sandbox, and persists an execution record retrievable by id. The
//! container backend is probed in the background at startup; while the probe
//! is pending (or failed) the server keeps accepting calls and reports the
//! backend state per-call.

use crate::fs::render;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars::JsonSchema,
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use toolbelt_core::{Error, PathGuard, Result as CoreResult};
use toolbelt_sandbox::{
    BackendStatus, ExecutionRecord, RecordStore, RunRequest, Sandbox, SandboxError,
};
use tracing::{info, warn};

/// Default script filename when none is given.
pub const SCRIPT_FILENAME_DEFAULT: &str = "script.py";

fn default_filename() -> String {
    SCRIPT_FILENAME_DEFAULT.to_string()
}

/// Map sandbox errors into the shared taxonomy.
fn map_sandbox_error(e: SandboxError) -> Error {
    match e {
        SandboxError::RecordNotFound { execution_id } => {
            Error::not_found(format!("execution record {execution_id}"))
        }
        SandboxError::ExecTimeout { timeout_ms } => Error::Timeout { timeout_ms },
        SandboxError::Unavailable { reason } => Error::NotInitialized { reason },
        SandboxError::Io(e) => Error::Io(e),
        SandboxError::Json(e) => Error::Json(e),
        other => Error::external(other.to_string()),
    }
}

/// Reduce a filename to a safe character set, forcing a .py suffix.
fn sanitize_filename(filename: &str) -> CoreResult<String> {
    let safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    if safe.is_empty() || safe.chars().all(|c| c == '.') {
        return Err(Error::invalid_input(format!(
            "filename {filename} has no usable characters"
        )));
    }
    if safe.ends_with(".py") {
        Ok(safe)
    } else {
        Ok(format!("{safe}.py"))
    }
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct WritePythonFileArgs {
    /// Python source code
    pub code: String,
    /// Target filename (".py" appended if missing)
    #[serde(default = "default_filename")]
    pub filename: String,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct FilenameArgs {
    /// Script filename in the scripts directory
    pub filename: String,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct ExecutePythonFileArgs {
    /// Script filename in the scripts directory (".py" appended if missing)
    pub filename: String,
    /// Command-line arguments, whitespace-separated
    #[serde(default)]
    pub args: String,
    /// Environment variables set inside the container
    #[serde(default)]
    pub env_vars: Option<HashMap<String, String>>,
    /// Timeout override in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct ExecutionIdArgs {
    /// Execution id returned by execute_python_file
    pub execution_id: String,
}

/// MCP server for sandboxed Python execution.
#[derive(Clone)]
pub struct ExecServer {
    guard: PathGuard,
    sandbox: Arc<dyn Sandbox>,
    store: Arc<RecordStore>,
    backend_status: Arc<RwLock<BackendStatus>>,
    tool_router: ToolRouter<Self>,
}

impl ExecServer {
    pub fn new(
        scripts_dir: impl Into<PathBuf>,
        sandbox: Arc<dyn Sandbox>,
        store: Arc<RecordStore>,
        backend_status: Arc<RwLock<BackendStatus>>,
    ) -> Self {
        Self {
            guard: PathGuard::new(scripts_dir),
            sandbox,
            store,
            backend_status,
            tool_router: Self::tool_router(),
        }
    }

    async fn write_python_file_inner(&self, code: &str, filename: &str) -> CoreResult<String> {
        let safe = sanitize_filename(filename)?;
        let resolved = self.guard.resolve(&safe)?;
        tokio::fs::create_dir_all(self.guard.base_dir()).await?;
        tokio::fs::write(&resolved, code).await?;
        info!(file = %safe, bytes = code.len(), "Staged python file");
        Ok(format!("Python code written to {safe} successfully"))
    }

    async fn list_python_files_inner(&self) -> CoreResult<String> {
        let mut reader = match tokio::fs::read_dir(self.guard.base_dir()).await {
            Ok(reader) => reader,
            // Nothing staged yet.
            Err(_) => return Ok("[]".to_string()),
        };
        let mut names = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".py") && entry.metadata().await?.is_file() {
                names.push(name);
            }
        }
        names.sort();
        Ok(serde_json::to_string_pretty(&names)?)
    }

    async fn read_python_file_inner(&self, filename: &str) -> CoreResult<String> {
        let safe = sanitize_filename(filename)?;
        let resolved = self.guard.resolve(&safe)?;
        tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|_| Error::not_found(format!("file {safe}")))
    }

    async fn execute_python_file_inner(&self, args: &ExecutePythonFileArgs) -> CoreResult<String> {
        let safe = sanitize_filename(&args.filename)?;
        let resolved = self.guard.resolve(&safe)?;
        if !resolved.is_file() {
            return Err(Error::not_found(format!("file {safe}")));
        }

        let argv: Vec<String> = args.args.split_whitespace().map(|s| s.to_string()).collect();
        let mut request = RunRequest::new(&safe).with_args(argv.clone());
        if let Some(env_vars) = &args.env_vars {
            for (key, value) in env_vars {
                request = request.with_env(key, value);
            }
        }
        let timeout_secs = args.timeout_secs;
        if let Some(secs) = timeout_secs {
            request = request.with_timeout_ms(secs.saturating_mul(1_000));
        }

        let output = self
            .sandbox
            .run(request)
            .await
            .map_err(map_sandbox_error)?;

        let status = if output.timed_out {
            format!(
                "Error: Execution timed out after {} seconds",
                output.duration_ms / 1_000
            )
        } else if output.is_success() {
            "Success".to_string()
        } else {
            format!("Error: exit code {}", output.status.code)
        };

        let record = ExecutionRecord::new(&safe)
            .with_args(argv)
            .with_outcome(status, output.status.code)
            .with_output(output.stdout_string(), output.stderr_string())
            .with_duration_ms(output.duration_ms);

        // Record persistence is best-effort; the caller still gets the output.
        if let Err(e) = self.store.save(&record) {
            warn!(execution_id = %record.execution_id, error = %e, "Failed to persist execution record");
        }

        Ok(record.render_text())
    }

    async fn get_execution_results_inner(&self, execution_id: &str) -> CoreResult<String> {
        let record = self
            .store
            .load(execution_id)
            .map_err(map_sandbox_error)?;
        Ok(record.render_text())
    }

    async fn docker_status_inner(&self) -> CoreResult<String> {
        let status = self.backend_status.read().await.clone();
        Ok(serde_json::to_string_pretty(&status)?)
    }
}

#[tool_router]
impl ExecServer {
    #[tool(description = "Write Python code to a file in the scripts directory")]
    pub async fn write_python_file(
        &self,
        Parameters(args): Parameters<WritePythonFileArgs>,
    ) -> String {
        render(self.write_python_file_inner(&args.code, &args.filename).await)
    }

    #[tool(description = "List staged Python files")]
    pub async fn list_python_files(&self) -> String {
        render(self.list_python_files_inner().await)
    }

    #[tool(description = "Read a staged Python file")]
    pub async fn read_python_file(&self, Parameters(args): Parameters<FilenameArgs>) -> String {
        render(self.read_python_file_inner(&args.filename).await)
    }

    #[tool(
        description = "Execute a staged Python file in an isolated container and persist an execution record"
    )]
    pub async fn execute_python_file(
        &self,
        Parameters(args): Parameters<ExecutePythonFileArgs>,
    ) -> String {
        render(self.execute_python_file_inner(&args).await)
    }

    #[tool(description = "Retrieve a past execution record by id")]
    pub async fn get_execution_results(
        &self,
        Parameters(args): Parameters<ExecutionIdArgs>,
    ) -> String {
        render(self.get_execution_results_inner(&args.execution_id).await)
    }

    #[tool(description = "Report the probed state of the container backend")]
    pub async fn docker_status(&self) -> String {
        render(self.docker_status_inner().await)
    }
}

#[tool_handler]
impl ServerHandler for ExecServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "toolbelt-exec".into(),
                title: Some("Toolbelt Python Execution Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Sandboxed Python execution with persisted execution records.".into(),
            ),
        }
    }
}
