//! Telemetry initialization
//!
//! Structured logging via tracing. Output always goes to stderr: the stdio
//! transport owns stdout for protocol frames, so anything printed there
//! corrupts the stream.

use tracing_subscriber::EnvFilter;

/// Default log level when neither RUST_LOG nor a verbosity flag applies.
pub const LOG_LEVEL_DEFAULT: &str = "info";

/// Telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name recorded on startup
    pub service_name: String,
    /// Fallback filter directive when RUST_LOG is unset
    pub log_level: String,
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            log_level: LOG_LEVEL_DEFAULT.to_string(),
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

/// Initialize the tracing subscriber.
///
/// RUST_LOG takes precedence over the configured fallback level. Must be
/// called at most once per process.
pub fn init_telemetry(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(service = %config.service_name, "Telemetry initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_defaults() {
        let config = TelemetryConfig::new("toolbelt-fs");
        assert_eq!(config.service_name, "toolbelt-fs");
        assert_eq!(config.log_level, LOG_LEVEL_DEFAULT);
    }

    #[test]
    fn test_telemetry_config_level_override() {
        let config = TelemetryConfig::new("toolbelt-fs").with_log_level("debug");
        assert_eq!(config.log_level, "debug");
    }
}
