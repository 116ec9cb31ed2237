//! Transport selection and server entry
//!
//! Every toolbelt binary supports two delivery modes: stdio (default, for
//! desktop hosts) and HTTP/SSE (`--web`, for browser-based hosts). The SSE
//! port resolves from the positional argument, then the MCP_PORT environment
//! variable, then the per-server default.

use crate::config::{ServerConfig, ENV_PORT};
use clap::Parser;
use rmcp::transport::sse_server::SseServer;
use rmcp::transport::stdio;
use rmcp::{ServerHandler, ServiceExt};
use std::net::SocketAddr;
use tracing::info;

/// Command-line arguments shared by every server binary.
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// Serve over HTTP/SSE instead of stdio
    #[arg(long)]
    pub web: bool,

    /// Port for the SSE transport (overrides MCP_PORT)
    pub port: Option<u16>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl ServeArgs {
    /// Pick the SSE port: positional argument, then MCP_PORT, then default.
    pub fn resolve_port(&self, default_port: u16) -> u16 {
        self.port
            .or_else(|| std::env::var(ENV_PORT).ok().and_then(|v| v.parse().ok()))
            .unwrap_or(default_port)
    }

    /// Fallback log filter derived from the verbosity flag.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Serve a handler over the transport selected by `args`.
///
/// In SSE mode the factory is invoked once per client connection; in stdio
/// mode exactly once. Blocks until the host disconnects (stdio) or ctrl-c
/// (SSE).
pub async fn run_server<S, F>(args: &ServeArgs, config: &ServerConfig, factory: F) -> anyhow::Result<()>
where
    S: ServerHandler,
    F: Fn() -> S + Send + 'static,
{
    if args.web {
        let port = args.resolve_port(config.port);
        let addr: SocketAddr = format!("{}:{}", config.bind_host, port).parse()?;
        info!(server = %config.name, %addr, "Starting SSE MCP server");

        let ct = SseServer::serve(addr).await?.with_service(factory);
        tokio::signal::ctrl_c().await?;
        ct.cancel();
    } else {
        info!(server = %config.name, "Starting stdio MCP server");
        let service = factory().serve(stdio()).await?;
        service.waiting().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_port_prefers_positional() {
        let args = ServeArgs {
            web: true,
            port: Some(9999),
            verbose: 0,
        };
        assert_eq!(args.resolve_port(8001), 9999);
    }

    #[test]
    fn test_resolve_port_falls_back_to_default() {
        let args = ServeArgs::default();
        // MCP_PORT is unset in the test environment.
        if std::env::var(ENV_PORT).is_err() {
            assert_eq!(args.resolve_port(8001), 8001);
        }
    }

    #[test]
    fn test_log_level_from_verbosity() {
        assert_eq!(ServeArgs::default().log_level(), "info");
        let args = ServeArgs {
            verbose: 1,
            ..Default::default()
        };
        assert_eq!(args.log_level(), "debug");
        let args = ServeArgs {
            verbose: 3,
            ..Default::default()
        };
        assert_eq!(args.log_level(), "trace");
    }
}
