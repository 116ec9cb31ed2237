//! Execution request and result types
//!
//! TigerStyle: explicit input/output with structured results.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Exit status of a container run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    /// Exit code (0 = success; -1 = synthetic, killed on timeout)
    pub code: i32,
    /// Signal used to kill the process, if any
    pub signal: Option<i32>,
}

impl ExitStatus {
    pub fn success() -> Self {
        Self {
            code: 0,
            signal: None,
        }
    }

    pub fn with_code(code: i32) -> Self {
        Self { code, signal: None }
    }

    /// Synthetic status for a run killed at the timeout boundary.
    pub fn timed_out() -> Self {
        Self {
            code: -1,
            signal: Some(9),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0 && self.signal.is_none()
    }
}

impl Default for ExitStatus {
    fn default() -> Self {
        Self::success()
    }
}

/// One request to run a staged script inside the sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// Script filename relative to the staged scripts directory
    pub filename: String,
    /// Command-line arguments passed to the script
    pub args: Vec<String>,
    /// Environment variables set inside the container
    pub env: Vec<(String, String)>,
    /// Timeout override in milliseconds (None = sandbox default)
    pub timeout_ms: Option<u64>,
}

impl RunRequest {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            args: Vec::new(),
            env: Vec::new(),
            timeout_ms: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// Captured output of one container run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecOutput {
    /// Exit status
    pub status: ExitStatus,
    /// Captured stdout
    pub stdout: Bytes,
    /// Captured stderr
    pub stderr: Bytes,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Whether the run was killed at the timeout boundary
    pub timed_out: bool,
    /// Whether stdout was truncated at the capture limit
    pub stdout_truncated: bool,
    /// Whether stderr was truncated at the capture limit
    pub stderr_truncated: bool,
}

impl ExecOutput {
    pub fn new(status: ExitStatus, stdout: Bytes, stderr: Bytes, duration_ms: u64) -> Self {
        Self {
            status,
            stdout,
            stderr,
            duration_ms,
            timed_out: false,
            stdout_truncated: false,
            stderr_truncated: false,
        }
    }

    /// Synthetic output for a run killed at the timeout boundary.
    pub fn from_timeout(timeout_ms: u64) -> Self {
        let mut output = Self::new(ExitStatus::timed_out(), Bytes::new(), Bytes::new(), timeout_ms);
        output.timed_out = true;
        output
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Stdout as text (lossy UTF-8 conversion).
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr as text (lossy UTF-8 conversion).
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Truncate a captured stream to the limit, reporting whether bytes were cut.
pub(crate) fn truncate_stream(mut raw: Vec<u8>, limit: usize) -> (Bytes, bool) {
    if raw.len() > limit {
        raw.truncate(limit);
        (Bytes::from(raw), true)
    } else {
        (Bytes::from(raw), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status_success() {
        let status = ExitStatus::success();
        assert!(status.is_success());
        assert_eq!(status.code, 0);
    }

    #[test]
    fn test_exit_status_timed_out_is_synthetic() {
        let status = ExitStatus::timed_out();
        assert!(!status.is_success());
        assert_eq!(status.code, -1);
        assert_eq!(status.signal, Some(9));
    }

    #[test]
    fn test_run_request_builder() {
        let request = RunRequest::new("script.py")
            .with_args(vec!["--fast".to_string()])
            .with_env("MODE", "test")
            .with_timeout_ms(5_000);
        assert_eq!(request.filename, "script.py");
        assert_eq!(request.args, vec!["--fast".to_string()]);
        assert_eq!(request.env, vec![("MODE".to_string(), "test".to_string())]);
        assert_eq!(request.timeout_ms, Some(5_000));
    }

    #[test]
    fn test_exec_output_from_timeout() {
        let output = ExecOutput::from_timeout(30_000);
        assert!(output.timed_out);
        assert!(!output.is_success());
        assert_eq!(output.status.code, -1);
        assert_eq!(output.duration_ms, 30_000);
    }

    #[test]
    fn test_exec_output_string_conversion() {
        let output = ExecOutput::new(
            ExitStatus::success(),
            Bytes::from("out"),
            Bytes::from("err"),
            10,
        );
        assert_eq!(output.stdout_string(), "out");
        assert_eq!(output.stderr_string(), "err");
    }

    #[test]
    fn test_exec_output_serde_round_trip() {
        let output = ExecOutput::new(
            ExitStatus::with_code(2),
            Bytes::from("partial"),
            Bytes::from("boom"),
            42,
        );
        let encoded = serde_json::to_string(&output).unwrap();
        let decoded: ExecOutput = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.status, output.status);
        assert_eq!(decoded.stdout_string(), "partial");
        assert_eq!(decoded.stderr_string(), "boom");
        assert_eq!(decoded.duration_ms, 42);
    }

    #[test]
    fn test_truncate_stream() {
        let (bytes, truncated) = truncate_stream(b"hello".to_vec(), 3);
        assert_eq!(&bytes[..], b"hel");
        assert!(truncated);

        let (bytes, truncated) = truncate_stream(b"hi".to_vec(), 3);
        assert_eq!(&bytes[..], b"hi");
        assert!(!truncated);
    }
}
