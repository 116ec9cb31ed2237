//! Docker-backed sandbox
//!
//! TigerStyle: isolation is delegated entirely to the container engine; this
//! module only constructs the invocation and enforces the wall-clock timeout.
//!
//! Each run gets a fresh container with no network, bounded memory/CPU,
//! dropped capabilities, and the scripts directory mounted read-only. A run
//! that outlives its budget is killed and reported with a synthetic exit
//! code.

use crate::config::SandboxConfig;
use crate::error::{SandboxError, SandboxResult};
use crate::exec::{truncate_stream, ExecOutput, ExitStatus, RunRequest};
use crate::traits::{BackendStatus, Sandbox};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Containers older than this multiple of the timeout are considered stale.
pub const STALE_TIMEOUT_MULTIPLIER: u64 = 2;

/// Sandbox that runs staged scripts in throwaway Docker containers.
pub struct DockerSandbox {
    config: SandboxConfig,
    /// Host directory holding staged scripts, mounted read-only
    scripts_dir: PathBuf,
    docker_bin: String,
}

impl DockerSandbox {
    pub fn new(config: SandboxConfig, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            scripts_dir: scripts_dir.into(),
            docker_bin: "docker".to_string(),
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Override the engine binary (used to point at a wrapper).
    pub fn with_docker_bin(mut self, bin: impl Into<String>) -> Self {
        self.docker_bin = bin.into();
        self
    }

    /// Build the `docker run` argument list for one request.
    fn build_run_args(&self, request: &RunRequest, container_name: &str) -> Vec<String> {
        let limits = &self.config.limits;
        let mut args = vec![
            "run".to_string(),
            "--name".to_string(),
            container_name.to_string(),
            "--label".to_string(),
            self.config.label.clone(),
            "--memory".to_string(),
            limits.memory_bytes_max.to_string(),
            "--cpus".to_string(),
            limits.cpu_count.to_string(),
            "--cap-drop".to_string(),
            "ALL".to_string(),
            "--security-opt".to_string(),
            "no-new-privileges:true".to_string(),
            "--workdir".to_string(),
            self.config.workdir.clone(),
            "--volume".to_string(),
            format!("{}:{}:ro", self.scripts_dir.display(), self.config.workdir),
        ];
        if !limits.network_enabled {
            args.push("--network".to_string());
            args.push("none".to_string());
        }
        for (key, value) in &request.env {
            args.push("--env".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push(self.config.image.clone());
        args.push("python".to_string());
        args.push(request.filename.clone());
        args.extend(request.args.iter().cloned());
        args
    }

    async fn docker(&self, args: &[&str]) -> SandboxResult<std::process::Output> {
        Command::new(&self.docker_bin)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SandboxError::ExecFailed {
                command: self.docker_bin.clone(),
                reason: e.to_string(),
            })
    }

    /// Kill and remove one container, logging failures.
    async fn remove_container(&self, name: &str) {
        if let Err(e) = self.docker(&["kill", name]).await {
            debug!(container = %name, error = %e, "Failed to kill container");
        }
        if let Err(e) = self.docker(&["rm", "-f", name]).await {
            warn!(container = %name, error = %e, "Failed to remove container");
        }
    }
}

#[async_trait]
impl Sandbox for DockerSandbox {
    async fn run(&self, request: RunRequest) -> SandboxResult<ExecOutput> {
        let timeout_ms = request
            .timeout_ms
            .unwrap_or(self.config.limits.exec_timeout_ms);
        let container_name = format!("toolbelt-exec-{}", Uuid::new_v4());
        let args = self.build_run_args(&request, &container_name);

        debug!(container = %container_name, file = %request.filename, "Starting container run");

        let mut cmd = Command::new(&self.docker_bin);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| SandboxError::ExecFailed {
            command: self.docker_bin.clone(),
            reason: e.to_string(),
        })?;

        let start = Instant::now();
        let waited = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            child.wait_with_output(),
        )
        .await;

        match waited {
            Ok(Ok(output)) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                let code = output.status.code().unwrap_or(-1);
                let limit = self.config.limits.output_bytes_max as usize;
                let (stdout, stdout_truncated) = truncate_stream(output.stdout, limit);
                let (stderr, stderr_truncated) = truncate_stream(output.stderr, limit);

                // The container is kept around until the next cleanup pass;
                // remove it eagerly since its output is already captured.
                self.remove_container(&container_name).await;

                let mut result =
                    ExecOutput::new(ExitStatus::with_code(code), stdout, stderr, duration_ms);
                result.stdout_truncated = stdout_truncated;
                result.stderr_truncated = stderr_truncated;
                Ok(result)
            }
            Ok(Err(e)) => {
                self.remove_container(&container_name).await;
                Err(SandboxError::ExecFailed {
                    command: self.docker_bin.clone(),
                    reason: e.to_string(),
                })
            }
            Err(_elapsed) => {
                info!(container = %container_name, timeout_ms, "Run exceeded budget, killing container");
                self.remove_container(&container_name).await;
                Ok(ExecOutput::from_timeout(timeout_ms))
            }
        }
    }

    async fn probe(&self) -> BackendStatus {
        let mut status = BackendStatus {
            probed: true,
            available: false,
            image_present: false,
            detail: String::new(),
        };

        match self.docker(&["version", "--format", "{{.Server.Version}}"]).await {
            Ok(output) if output.status.success() => {
                status.available = true;
                status.detail = format!(
                    "docker server version {}",
                    String::from_utf8_lossy(&output.stdout).trim()
                );
            }
            Ok(output) => {
                status.detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
                return status;
            }
            Err(e) => {
                status.detail = e.to_string();
                return status;
            }
        }

        let inspect = self.docker(&["image", "inspect", &self.config.image]).await;
        status.image_present = matches!(&inspect, Ok(output) if output.status.success());

        if !status.image_present {
            // One pull attempt, mirroring first-use behavior.
            info!(image = %self.config.image, "Image missing, pulling");
            if let Ok(output) = self.docker(&["pull", &self.config.image]).await {
                status.image_present = output.status.success();
            }
        }

        status
    }

    async fn cleanup_stale(&self) {
        let filter = format!("label={}", self.config.label);
        let listed = match self.docker(&["ps", "-aq", "--filter", &filter]).await {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).to_string()
            }
            Ok(output) => {
                warn!(
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "Failed to list containers for cleanup"
                );
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to list containers for cleanup");
                return;
            }
        };

        let stale_after_ms = self.config.limits.exec_timeout_ms * STALE_TIMEOUT_MULTIPLIER;
        for id in listed.lines().filter(|l| !l.is_empty()) {
            let inspected = self
                .docker(&["inspect", "--format", "{{.State.Running}}|{{.Created}}", id])
                .await;
            let fields = match &inspected {
                Ok(output) if output.status.success() => {
                    String::from_utf8_lossy(&output.stdout).trim().to_string()
                }
                _ => {
                    warn!(container = %id, "Failed to inspect container during cleanup");
                    continue;
                }
            };

            let (running, created) = match fields.split_once('|') {
                Some(parts) => parts,
                None => continue,
            };
            let age_ms = DateTime::parse_from_rfc3339(created)
                .map(|t| (Utc::now() - t.with_timezone(&Utc)).num_milliseconds().max(0) as u64)
                .unwrap_or(u64::MAX);

            if running == "true" && age_ms > stale_after_ms {
                info!(container = %id, age_ms, "Removing stale running container");
                self.remove_container(id).await;
            } else if running != "true" {
                debug!(container = %id, "Removing leftover stopped container");
                if let Err(e) = self.docker(&["rm", id]).await {
                    warn!(container = %id, error = %e, "Failed to remove container");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> DockerSandbox {
        DockerSandbox::new(SandboxConfig::default(), "/tmp/scripts")
    }

    #[test]
    fn test_run_args_isolation_flags() {
        let request = RunRequest::new("script.py");
        let args = sandbox().build_run_args(&request, "toolbelt-exec-test");
        let joined = args.join(" ");

        assert!(joined.contains("--network none"));
        assert!(joined.contains("--cap-drop ALL"));
        assert!(joined.contains("--security-opt no-new-privileges:true"));
        assert!(joined.contains("/tmp/scripts:/app:ro"));
        assert!(joined.contains("--memory 536870912"));
    }

    #[test]
    fn test_run_args_script_and_arguments_last() {
        let request =
            RunRequest::new("job.py").with_args(vec!["--n".to_string(), "5".to_string()]);
        let args = sandbox().build_run_args(&request, "c");
        let image_pos = args.iter().position(|a| a == "python:3.11-slim");
        assert!(image_pos.is_some());
        let tail = &args[image_pos.unwrap_or(0)..];
        assert_eq!(tail, &["python:3.11-slim", "python", "job.py", "--n", "5"]);
    }

    #[test]
    fn test_run_args_env_flags() {
        let request = RunRequest::new("s.py").with_env("MODE", "test");
        let args = sandbox().build_run_args(&request, "c");
        let joined = args.join(" ");
        assert!(joined.contains("--env MODE=test"));
    }

    #[test]
    fn test_run_args_network_enabled_drops_none() {
        let mut config = SandboxConfig::default();
        config.limits.network_enabled = true;
        let sandbox = DockerSandbox::new(config, "/tmp/scripts");
        let args = sandbox.build_run_args(&RunRequest::new("s.py"), "c");
        assert!(!args.iter().any(|a| a == "--network"));
    }
}
