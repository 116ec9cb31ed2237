//! Sandbox configuration
//!
//! TigerStyle: explicit resource limits with units in names. Isolation is
//! delegated to the container engine; these values only shape the invocation.

use crate::error::{SandboxError, SandboxResult};
use serde::{Deserialize, Serialize};

/// Default container image for Python execution.
pub const IMAGE_DEFAULT: &str = "python:3.11-slim";

/// Default working directory inside the container.
pub const CONTAINER_WORKDIR_DEFAULT: &str = "/app";

/// Default memory limit (512MB).
pub const MEMORY_BYTES_MAX_DEFAULT: u64 = 512 * 1024 * 1024;

/// Default CPU allowance.
pub const CPU_COUNT_DEFAULT: f64 = 1.0;

/// Default wall-clock execution budget (30 seconds).
pub const EXEC_TIMEOUT_MS_DEFAULT: u64 = 30_000;

/// Default cap on captured output per stream (10MB).
pub const OUTPUT_BYTES_MAX_DEFAULT: u64 = 10 * 1024 * 1024;

/// Label attached to every container so stale ones can be found later.
pub const CONTAINER_LABEL_DEFAULT: &str = "created_by=toolbelt-exec";

/// Resource limits applied to each container run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Memory limit in bytes
    pub memory_bytes_max: u64,
    /// CPU allowance (fractional CPUs)
    pub cpu_count: f64,
    /// Wall-clock execution budget in milliseconds
    pub exec_timeout_ms: u64,
    /// Whether the container gets network access
    pub network_enabled: bool,
    /// Maximum captured bytes per output stream
    pub output_bytes_max: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_bytes_max: MEMORY_BYTES_MAX_DEFAULT,
            cpu_count: CPU_COUNT_DEFAULT,
            exec_timeout_ms: EXEC_TIMEOUT_MS_DEFAULT,
            network_enabled: false,
            output_bytes_max: OUTPUT_BYTES_MAX_DEFAULT,
        }
    }
}

/// Configuration for the Docker sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Container image to run
    pub image: String,
    /// Working directory inside the container
    pub workdir: String,
    /// Label applied to every container (key=value)
    pub label: String,
    /// Resource limits
    pub limits: ResourceLimits,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            image: IMAGE_DEFAULT.to_string(),
            workdir: CONTAINER_WORKDIR_DEFAULT.to_string(),
            label: CONTAINER_LABEL_DEFAULT.to_string(),
            limits: ResourceLimits::default(),
        }
    }
}

impl SandboxConfig {
    /// Set the container image.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Set the execution timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.limits.exec_timeout_ms = timeout_ms;
        self
    }

    /// Set the memory limit.
    pub fn with_memory_bytes_max(mut self, bytes: u64) -> Self {
        self.limits.memory_bytes_max = bytes;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> SandboxResult<()> {
        if self.image.is_empty() {
            return Err(SandboxError::Config {
                reason: "image must not be empty".to_string(),
            });
        }
        if self.limits.exec_timeout_ms == 0 {
            return Err(SandboxError::Config {
                reason: "exec_timeout_ms must be non-zero".to_string(),
            });
        }
        if self.limits.cpu_count <= 0.0 {
            return Err(SandboxError::Config {
                reason: "cpu_count must be positive".to_string(),
            });
        }
        if !self.label.contains('=') {
            return Err(SandboxError::Config {
                reason: "label must be key=value".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_valid() {
        let config = SandboxConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.image, IMAGE_DEFAULT);
        assert_eq!(config.workdir, CONTAINER_WORKDIR_DEFAULT);
        assert!(!config.limits.network_enabled);
    }

    #[test]
    fn test_config_builders() {
        let config = SandboxConfig::default()
            .with_image("python:3.12-slim")
            .with_timeout_ms(5_000)
            .with_memory_bytes_max(256 * 1024 * 1024);
        assert_eq!(config.image, "python:3.12-slim");
        assert_eq!(config.limits.exec_timeout_ms, 5_000);
        assert_eq!(config.limits.memory_bytes_max, 256 * 1024 * 1024);
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let config = SandboxConfig::default().with_timeout_ms(0);
        assert!(matches!(
            config.validate(),
            Err(SandboxError::Config { .. })
        ));
    }

    #[test]
    fn test_config_rejects_bad_label() {
        let mut config = SandboxConfig::default();
        config.label = "no-separator".to_string();
        assert!(config.validate().is_err());
    }
}
