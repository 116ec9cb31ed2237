//! Shared foundation for the toolbelt MCP servers
//!
//! TigerStyle: one small crate for the concerns every server repeats.
//!
//! # Overview
//!
//! Every toolbelt server is a thin adapter translating one external
//! capability (filesystem, git binary, REST API, container runtime) into the
//! MCP tool-call convention. This crate carries the pieces they share:
//! - **Error taxonomy**: shallow, uniform failure classes rendered as text at
//!   the tool boundary
//! - **Path guard**: confines caller-supplied paths to a base directory and
//!   blocks sensitive file patterns
//! - **Config**: construction-time configuration, no mutable globals
//! - **Telemetry**: tracing to stderr (stdout belongs to the transport)
//! - **Serve**: stdio vs HTTP/SSE transport selection

mod config;
mod error;
mod guard;
mod serve;
mod telemetry;

pub use config::{ServerConfig, BASE_DIR_DEFAULT, BIND_HOST_DEFAULT, ENV_BASE_DIR, ENV_PORT};
pub use error::{Error, Result};
pub use guard::{PathGuard, DENIED_PATTERNS_DEFAULT};
pub use serve::{run_server, ServeArgs};
pub use telemetry::{init_telemetry, TelemetryConfig, LOG_LEVEL_DEFAULT};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_module_compiles() {
        // Smoke test
        let _guard = PathGuard::new("/tmp");
        let _config = ServerConfig::new("fs", 8001);
    }
}
