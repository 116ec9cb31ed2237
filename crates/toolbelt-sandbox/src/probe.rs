//! Background backend probe
//!
//! Probes the container engine at startup without blocking the server from
//! accepting requests: a supervised task refreshes a shared status flag, and
//! handlers read the flag when asked. Shutdown waits briefly for the task.

use crate::traits::{BackendStatus, Sandbox};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How long shutdown waits for an in-flight probe (2 seconds).
pub const PROBE_SHUTDOWN_WAIT_MS: u64 = 2_000;

/// Supervised startup probe with a shared status flag.
pub struct BackendProbe {
    status: Arc<RwLock<BackendStatus>>,
    handle: Option<JoinHandle<()>>,
}

impl BackendProbe {
    /// Spawn the probe. Also runs one stale-container cleanup pass once the
    /// backend answers.
    pub fn spawn(sandbox: Arc<dyn Sandbox>) -> Self {
        let status = Arc::new(RwLock::new(BackendStatus::unknown()));
        let shared = Arc::clone(&status);

        let handle = tokio::spawn(async move {
            let probed = sandbox.probe().await;
            info!(
                available = probed.available,
                image_present = probed.image_present,
                detail = %probed.detail,
                "Execution backend probe finished"
            );
            if probed.available {
                sandbox.cleanup_stale().await;
            }
            *shared.write().await = probed;
        });

        Self {
            status,
            handle: Some(handle),
        }
    }

    /// Handle to the shared status flag.
    pub fn status_handle(&self) -> Arc<RwLock<BackendStatus>> {
        Arc::clone(&self.status)
    }

    /// Current status snapshot.
    pub async fn current(&self) -> BackendStatus {
        self.status.read().await.clone()
    }

    /// Wait briefly for the probe task, then give up.
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.handle.take() {
            let wait = Duration::from_millis(PROBE_SHUTDOWN_WAIT_MS);
            if tokio::time::timeout(wait, handle).await.is_err() {
                warn!("Backend probe did not finish before shutdown");
            }
        }
    }
}
