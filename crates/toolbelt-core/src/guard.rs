//! Path guard: confine caller-supplied paths to a base directory
//!
//! TigerStyle: one reusable guard, explicit configuration. Every server that
//! touches the filesystem resolves paths through a `PathGuard` instead of
//! carrying its own normalization logic.
//!
//! Resolution is purely lexical. `.` and `..` segments are folded without
//! consulting the filesystem, so a rejected path is rejected before any
//! filesystem access happens.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// File patterns denied by default (environment-secret files).
pub const DENIED_PATTERNS_DEFAULT: &[&str] = &[".env"];

/// Validates caller-supplied relative paths against a base directory and a
/// set of denied file patterns.
#[derive(Debug, Clone)]
pub struct PathGuard {
    base_dir: PathBuf,
    denied_patterns: Vec<String>,
}

impl PathGuard {
    /// Create a guard with the default denied patterns.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            denied_patterns: DENIED_PATTERNS_DEFAULT
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Replace the denied pattern set.
    pub fn with_denied_patterns(mut self, patterns: Vec<String>) -> Self {
        self.denied_patterns = patterns;
        self
    }

    /// The base directory all resolved paths live under.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a relative path to an absolute path under the base directory.
    ///
    /// An empty input resolves to the base directory itself. Fails with
    /// `AccessDenied` if any segment matches a denied pattern, and with
    /// `InvalidPath` if the input is absolute or escapes the base directory.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let mut stack: Vec<&std::ffi::OsStr> = Vec::new();

        for component in Path::new(relative).components() {
            match component {
                Component::Normal(segment) => {
                    self.check_segment(relative, segment)?;
                    stack.push(segment);
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if stack.pop().is_none() {
                        return Err(Error::InvalidPath {
                            path: relative.to_string(),
                        });
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::InvalidPath {
                        path: relative.to_string(),
                    });
                }
            }
        }

        let mut resolved = self.base_dir.clone();
        for segment in stack {
            resolved.push(segment);
        }
        Ok(resolved)
    }

    fn check_segment(&self, path: &str, segment: &std::ffi::OsStr) -> Result<()> {
        let segment = segment.to_string_lossy();
        for pattern in &self.denied_patterns {
            if segment.as_ref() == pattern || segment.ends_with(pattern.as_str()) {
                return Err(Error::AccessDenied {
                    path: path.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> PathGuard {
        PathGuard::new("/sandbox")
    }

    #[test]
    fn test_resolve_simple_path() {
        let resolved = guard().resolve("docs/readme.txt").unwrap();
        assert_eq!(resolved, PathBuf::from("/sandbox/docs/readme.txt"));
    }

    #[test]
    fn test_resolve_empty_path_is_base() {
        let resolved = guard().resolve("").unwrap();
        assert_eq!(resolved, PathBuf::from("/sandbox"));
    }

    #[test]
    fn test_resolve_folds_dot_segments() {
        let resolved = guard().resolve("a/./b/../c").unwrap();
        assert_eq!(resolved, PathBuf::from("/sandbox/a/c"));
    }

    #[test]
    fn test_rejects_traversal_escape() {
        let result = guard().resolve("../outside");
        assert!(matches!(result, Err(Error::InvalidPath { .. })));

        let result = guard().resolve("a/../../outside");
        assert!(matches!(result, Err(Error::InvalidPath { .. })));

        let result = guard().resolve("../../../etc/passwd");
        assert!(matches!(result, Err(Error::InvalidPath { .. })));
    }

    #[test]
    fn test_rejects_absolute_path() {
        let result = guard().resolve("/etc/passwd");
        assert!(matches!(result, Err(Error::InvalidPath { .. })));
    }

    #[test]
    fn test_rejects_sensitive_filename() {
        let result = guard().resolve("secrets/.env");
        assert!(matches!(result, Err(Error::AccessDenied { .. })));
    }

    #[test]
    fn test_rejects_sensitive_segment_anywhere() {
        let result = guard().resolve(".env/nested/file.txt");
        assert!(matches!(result, Err(Error::AccessDenied { .. })));
    }

    #[test]
    fn test_rejects_sensitive_suffix() {
        let result = guard().resolve("config/prod.env");
        assert!(matches!(result, Err(Error::AccessDenied { .. })));
    }

    #[test]
    fn test_denied_even_when_traversal_safe() {
        // Pattern denial applies before any containment reasoning.
        let result = guard().resolve(".env");
        assert!(matches!(result, Err(Error::AccessDenied { .. })));
    }

    #[test]
    fn test_custom_patterns() {
        let guard = PathGuard::new("/sandbox").with_denied_patterns(vec![".secret".to_string()]);
        assert!(guard.resolve("app.secret").is_err());
        // Default pattern no longer applies.
        assert!(guard.resolve("config/.env").is_ok());
    }
}
