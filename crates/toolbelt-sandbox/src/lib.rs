//! Sandboxed code execution for the toolbelt exec server
//!
//! TigerStyle: secure isolation with explicit limits.
//!
//! # Overview
//!
//! Staged scripts run inside throwaway containers with explicit resource
//! limits; every run leaves a persisted execution record retrievable by id:
//! - **DockerSandbox**: builds the container invocation and enforces the
//!   wall-clock timeout; isolation itself is the engine's job
//! - **BackendProbe**: supervised startup probe with a shared status flag
//! - **RecordStore**: flat-file execution records plus per-run text logs
//!
//! The `Sandbox` trait is the seam between handlers and the engine, so the
//! exec server is testable without Docker.

mod config;
mod docker;
mod error;
mod exec;
mod probe;
mod record;
mod traits;

pub use config::{
    ResourceLimits, SandboxConfig, CONTAINER_LABEL_DEFAULT, CONTAINER_WORKDIR_DEFAULT,
    CPU_COUNT_DEFAULT, EXEC_TIMEOUT_MS_DEFAULT, IMAGE_DEFAULT, MEMORY_BYTES_MAX_DEFAULT,
    OUTPUT_BYTES_MAX_DEFAULT,
};
pub use docker::{DockerSandbox, STALE_TIMEOUT_MULTIPLIER};
pub use error::{SandboxError, SandboxResult};
pub use exec::{ExecOutput, ExitStatus, RunRequest};
pub use probe::{BackendProbe, PROBE_SHUTDOWN_WAIT_MS};
pub use record::{ExecutionRecord, RecordStore, MAPPINGS_FILE};
pub use traits::{BackendStatus, Sandbox};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_module_compiles() {
        // Smoke test
        let _config = SandboxConfig::default();
        let _request = RunRequest::new("script.py");
    }
}
