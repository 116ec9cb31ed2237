//! Sandbox trait
//!
//! TigerStyle: trait seam between the exec server and the container engine,
//! so handler logic is testable without Docker.

use crate::error::SandboxResult;
use crate::exec::{ExecOutput, RunRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Probed state of the execution backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    /// Whether the probe has completed at least once
    pub probed: bool,
    /// Engine reachable
    pub available: bool,
    /// Base image present locally
    pub image_present: bool,
    /// Human-readable detail (engine version or failure reason)
    pub detail: String,
}

impl BackendStatus {
    /// Status before the first probe has finished.
    pub fn unknown() -> Self {
        Self {
            probed: false,
            available: false,
            image_present: false,
            detail: "probe has not completed yet".to_string(),
        }
    }
}

/// An isolated execution backend for staged scripts.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Run one staged script to completion, enforcing the timeout.
    async fn run(&self, request: RunRequest) -> SandboxResult<ExecOutput>;

    /// Probe engine reachability and image presence.
    ///
    /// Failures are reported in the returned status, never as an error; the
    /// server stays up and reports failure per-call.
    async fn probe(&self) -> BackendStatus;

    /// Remove leftover containers from earlier runs. Best-effort; failures
    /// are logged, never propagated.
    async fn cleanup_stale(&self);
}
