//! Shared error taxonomy for all toolbelt servers
//!
//! TigerStyle: explicit, shallow error classes. Every handler catches these
//! at the tool boundary and renders a descriptive message; nothing crosses
//! the transport as a raw error.

use thiserror::Error;

/// Errors shared by every toolbelt server.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad path, empty required field, disallowed pattern
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Path matches a sensitive-file pattern
    #[error("access denied: {path} matches a protected pattern")]
    AccessDenied { path: String },

    /// Path escapes the configured base directory
    #[error("invalid path: {path} resolves outside the base directory")]
    InvalidPath { path: String },

    /// Missing file, branch, execution id, ...
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Path exists but is a directory where a file was expected
    #[error("not a file: {path}")]
    NotAFile { path: String },

    /// Content is not valid text
    #[error("cannot decode {path}: not a text file or unsupported encoding")]
    DecodeError { path: String },

    /// Non-zero exit code or HTTP error from a delegate system
    #[error("external failure: {reason}")]
    ExternalFailure { reason: String },

    /// Wall-clock budget exceeded
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Missing credential or unavailable backend
    #[error("not initialized: {reason}")]
    NotInitialized { reason: String },

    /// Invalid configuration value
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for an `InvalidInput` error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Shorthand for a `NotFound` error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Shorthand for an `ExternalFailure` error.
    pub fn external(reason: impl Into<String>) -> Self {
        Self::ExternalFailure {
            reason: reason.into(),
        }
    }
}

/// Result type for toolbelt operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::AccessDenied {
            path: "secrets/.env".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "access denied: secrets/.env matches a protected pattern"
        );

        let err = Error::Timeout { timeout_ms: 30_000 };
        assert_eq!(err.to_string(), "operation timed out after 30000ms");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_shorthands() {
        assert!(matches!(
            Error::invalid_input("empty"),
            Error::InvalidInput { .. }
        ));
        assert!(matches!(Error::not_found("x"), Error::NotFound { .. }));
        assert!(matches!(Error::external("x"), Error::ExternalFailure { .. }));
    }
}
