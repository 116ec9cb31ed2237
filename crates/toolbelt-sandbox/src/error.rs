//! Sandbox error types
//!
//! TigerStyle: explicit error variants with context.

use thiserror::Error;

/// Errors from sandboxed execution and record storage.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// The container backend is unreachable or unusable
    #[error("execution backend unavailable: {reason}")]
    Unavailable { reason: String },

    /// The container invocation could not be started or failed abnormally
    #[error("execution failed for {command}: {reason}")]
    ExecFailed { command: String, reason: String },

    /// Wall-clock budget exceeded; the container was killed
    #[error("execution timed out after {timeout_ms}ms")]
    ExecTimeout { timeout_ms: u64 },

    /// No execution record stored under this id
    #[error("execution record not found: {execution_id}")]
    RecordNotFound { execution_id: String },

    /// Invalid sandbox configuration
    #[error("invalid sandbox configuration: {reason}")]
    Config { reason: String },

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = std::result::Result<T, SandboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SandboxError::ExecTimeout { timeout_ms: 30_000 };
        assert_eq!(err.to_string(), "execution timed out after 30000ms");

        let err = SandboxError::RecordNotFound {
            execution_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "execution record not found: abc");
    }
}
