//! Server configuration
//!
//! TigerStyle: explicit construction-time configuration. Base directories
//! and ports are never hard-coded in handlers; each binary builds a
//! `ServerConfig` at startup and passes it down.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the base directory.
pub const ENV_BASE_DIR: &str = "TOOLBELT_BASE_DIR";

/// Environment variable overriding the SSE port.
pub const ENV_PORT: &str = "MCP_PORT";

/// Default bind host for the SSE transport.
pub const BIND_HOST_DEFAULT: &str = "127.0.0.1";

/// Default base directory, relative to the working directory.
pub const BASE_DIR_DEFAULT: &str = "workspace";

/// Configuration shared by every toolbelt server binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server name, used for logging and the MCP implementation info
    pub name: String,
    /// Directory all file operations are confined to
    pub base_dir: PathBuf,
    /// Host to bind in SSE mode
    pub bind_host: String,
    /// Port to bind in SSE mode
    pub port: u16,
}

impl ServerConfig {
    /// Create a configuration with default host and base directory.
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            base_dir: PathBuf::from(BASE_DIR_DEFAULT),
            bind_host: BIND_HOST_DEFAULT.to_string(),
            port,
        }
    }

    /// Create a configuration, honoring `TOOLBELT_BASE_DIR` when set.
    pub fn from_env(name: impl Into<String>, port: u16) -> Self {
        let mut config = Self::new(name, port);
        if let Ok(dir) = std::env::var(ENV_BASE_DIR) {
            config.base_dir = PathBuf::from(dir);
        }
        config
    }

    /// Set the base directory.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Set the SSE bind host.
    pub fn with_bind_host(mut self, host: impl Into<String>) -> Self {
        self.bind_host = host.into();
        self
    }

    /// Set the SSE port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidConfiguration {
                field: "name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.base_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfiguration {
                field: "base_dir".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.port == 0 {
            return Err(Error::InvalidConfiguration {
                field: "port".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Create the base directory if missing.
    ///
    /// Failure here is fatal at startup; it is the only error that stops a
    /// server from coming up.
    pub fn ensure_base_dir(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(&self.base_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ServerConfig::new("fs", 8001);
        assert_eq!(config.name, "fs");
        assert_eq!(config.bind_host, BIND_HOST_DEFAULT);
        assert_eq!(config.port, 8001);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builders() {
        let config = ServerConfig::new("git", 8004)
            .with_base_dir("/tmp/repo")
            .with_bind_host("0.0.0.0")
            .with_port(9000);
        assert_eq!(config.base_dir, PathBuf::from("/tmp/repo"));
        assert_eq!(config.bind_host, "0.0.0.0");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_config_validation_rejects_zero_port() {
        let config = ServerConfig::new("fs", 8001).with_port(0);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_ensure_base_dir_creates() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested/workspace");
        let config = ServerConfig::new("fs", 8001).with_base_dir(&base);
        config.ensure_base_dir().unwrap();
        assert!(base.is_dir());
    }
}
