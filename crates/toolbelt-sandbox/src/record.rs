//! Execution records
//!
//! Every sandboxed run persists its outcome under a generated id: one entry
//! in a flat JSON mapping file plus a standalone text log per run. Records
//! accumulate until cleaned manually.
//!
//! The mapping file is read-modify-write with no cross-process locking;
//! concurrent writers are last-writer-wins.

use crate::error::{SandboxError, SandboxResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Name of the flat mapping file inside the output directory.
pub const MAPPINGS_FILE: &str = "execution_mappings.json";

/// Timestamp format used in per-run log filenames.
const LOG_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Persisted outcome of one sandboxed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub execution_id: String,
    pub filename: String,
    pub args: Vec<String>,
    /// Human-readable status line ("Success", "Error: ...")
    pub status: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ExecutionRecord {
    /// Create a record with a fresh id and the current time.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            execution_id: Uuid::new_v4().to_string(),
            filename: filename.into(),
            args: Vec::new(),
            status: String::new(),
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            timestamp: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_outcome(mut self, status: impl Into<String>, exit_code: i32) -> Self {
        self.status = status.into();
        self.exit_code = exit_code;
        self
    }

    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Filename of this record's standalone text log.
    pub fn log_filename(&self) -> String {
        format!(
            "execution_{}_{}.txt",
            self.timestamp.format(LOG_TIMESTAMP_FORMAT),
            self.execution_id
        )
    }

    /// Render the record as the text stored in the per-run log.
    pub fn render_text(&self) -> String {
        format!(
            "Execution ID: {}\nFile: {}\nArguments: {}\nTimestamp: {}\nStatus: {}\nExit code: {}\nDuration: {}ms\n\n=== STDOUT ===\n{}\n\n=== STDERR ===\n{}\n",
            self.execution_id,
            self.filename,
            if self.args.is_empty() {
                "(none)".to_string()
            } else {
                self.args.join(" ")
            },
            self.timestamp.to_rfc3339(),
            self.status,
            self.exit_code,
            self.duration_ms,
            self.stdout,
            self.stderr,
        )
    }
}

/// Flat-file store for execution records.
pub struct RecordStore {
    output_dir: PathBuf,
}

impl RecordStore {
    /// Open a store, creating the output directory if missing.
    pub fn new(output_dir: impl Into<PathBuf>) -> SandboxResult<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn mappings_path(&self) -> PathBuf {
        self.output_dir.join(MAPPINGS_FILE)
    }

    fn read_all(&self) -> SandboxResult<HashMap<String, ExecutionRecord>> {
        let path = self.mappings_path();
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persist a record: update the mapping file and write the per-run log.
    pub fn save(&self, record: &ExecutionRecord) -> SandboxResult<PathBuf> {
        let mut records = self.read_all()?;
        records.insert(record.execution_id.clone(), record.clone());
        let serialized = serde_json::to_string_pretty(&records)?;
        std::fs::write(self.mappings_path(), serialized)?;

        let log_path = self.output_dir.join(record.log_filename());
        std::fs::write(&log_path, record.render_text())?;
        Ok(log_path)
    }

    /// Load a record by execution id.
    pub fn load(&self, execution_id: &str) -> SandboxResult<ExecutionRecord> {
        let mut records = self.read_all()?;
        records
            .remove(execution_id)
            .ok_or_else(|| SandboxError::RecordNotFound {
                execution_id: execution_id.to_string(),
            })
    }

    /// All stored execution ids, most recent first.
    pub fn list_ids(&self) -> SandboxResult<Vec<String>> {
        let records = self.read_all()?;
        let mut entries: Vec<_> = records.into_values().collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries.into_iter().map(|r| r.execution_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("output")).unwrap();
        (dir, store)
    }

    fn sample() -> ExecutionRecord {
        ExecutionRecord::new("script.py")
            .with_args(vec!["--n".to_string()])
            .with_outcome("Success", 0)
            .with_output("hello\n", "")
            .with_duration_ms(12)
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let (_dir, store) = store();
        let record = sample();
        store.save(&record).unwrap();

        let loaded = store.load(&record.execution_id).unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.stdout, "hello\n");
        assert_eq!(loaded.exit_code, 0);
    }

    #[test]
    fn test_load_unknown_id_is_not_found() {
        let (_dir, store) = store();
        let result = store.load("no-such-id");
        assert!(matches!(result, Err(SandboxError::RecordNotFound { .. })));
    }

    #[test]
    fn test_save_writes_per_run_log() {
        let (_dir, store) = store();
        let record = sample();
        let log_path = store.save(&record).unwrap();

        assert!(log_path.is_file());
        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains(&record.execution_id));
        assert!(content.contains("=== STDOUT ==="));
        assert!(content.contains("hello"));
    }

    #[test]
    fn test_multiple_records_accumulate() {
        let (_dir, store) = store();
        let first = sample();
        let second = sample();
        store.save(&first).unwrap();
        store.save(&second).unwrap();

        let ids = store.list_ids().unwrap();
        assert_eq!(ids.len(), 2);
        assert!(store.load(&first.execution_id).is_ok());
        assert!(store.load(&second.execution_id).is_ok());
    }

    #[test]
    fn test_log_filename_shape() {
        let record = sample();
        let name = record.log_filename();
        assert!(name.starts_with("execution_"));
        assert!(name.ends_with(&format!("{}.txt", record.execution_id)));
    }
}
