//! Documentation lookup MCP server
//!
//! Serves a fixed document tree with substring search. File content is
//! cached in memory after first read, keyed by absolute path, for the life
//! of the process; there is no invalidation.

use crate::fs::render;
use regex::Regex;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars::JsonSchema,
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use toolbelt_core::{Error, PathGuard, Result as CoreResult};
use tracing::debug;

/// Minimum query length for searches.
pub const SEARCH_QUERY_CHARS_MIN: usize = 3;

/// Context lines shown before a match.
pub const SEARCH_CONTEXT_BEFORE: usize = 2;

/// Context lines shown after a match.
pub const SEARCH_CONTEXT_AFTER: usize = 2;

/// Default cap on matches shown per file.
pub const SEARCH_MATCHES_MAX_DEFAULT: u32 = 5;

/// Files larger than this are skipped during search (10MB).
pub const SEARCH_FILE_BYTES_MAX: u64 = 10 * 1024 * 1024;

/// Extensions considered searchable documentation.
pub const SEARCHABLE_EXTENSIONS: &[&str] = &["txt", "md", "py"];

fn default_max_results() -> u32 {
    SEARCH_MATCHES_MAX_DEFAULT
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct SearchDocsArgs {
    /// Text to search for (case-insensitive, minimum 3 characters)
    pub query: String,
    /// Maximum matches shown per file
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct SearchFileArgs {
    /// File path relative to the docs directory
    pub filename: String,
    /// Text to search for (case-insensitive, minimum 3 characters)
    pub query: String,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct DocFileArgs {
    /// File path relative to the docs directory
    pub filename: String,
}

/// One matched window of lines with its line-range label.
fn match_windows(content: &str, pattern: &Regex, max_matches: usize) -> (Vec<String>, usize) {
    let lines: Vec<&str> = content.lines().collect();
    let mut windows = Vec::new();
    let mut total = 0usize;

    for (index, line) in lines.iter().enumerate() {
        if !pattern.is_match(line) {
            continue;
        }
        total += 1;
        if windows.len() >= max_matches {
            continue;
        }
        let start = index.saturating_sub(SEARCH_CONTEXT_BEFORE);
        let end = (index + SEARCH_CONTEXT_AFTER + 1).min(lines.len());
        let mut block = format!("[Lines {}-{}]\n", start + 1, end);
        for context_line in &lines[start..end] {
            block.push_str(context_line);
            block.push('\n');
        }
        windows.push(block);
    }

    (windows, total)
}

/// Build the case-insensitive literal pattern for a query.
fn build_pattern(query: &str) -> CoreResult<Regex> {
    let trimmed = query.trim();
    if trimmed.chars().count() < SEARCH_QUERY_CHARS_MIN {
        return Err(Error::invalid_input(format!(
            "query must be at least {SEARCH_QUERY_CHARS_MIN} characters"
        )));
    }
    Regex::new(&format!("(?i){}", regex::escape(trimmed)))
        .map_err(|e| Error::invalid_input(format!("bad query: {e}")))
}

fn is_searchable(path: &std::path::Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    // Dotfiles are never documentation.
    if name.starts_with('.') {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SEARCHABLE_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// MCP server for documentation search and retrieval.
#[derive(Clone)]
pub struct DocsServer {
    guard: PathGuard,
    cache: Arc<RwLock<HashMap<PathBuf, Arc<String>>>>,
    tool_router: ToolRouter<Self>,
}

impl DocsServer {
    pub fn new(docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            guard: PathGuard::new(docs_dir),
            cache: Arc::new(RwLock::new(HashMap::new())),
            tool_router: Self::tool_router(),
        }
    }

    /// Read a file through the cache. First read fills the entry; later
    /// reads never touch the disk again.
    async fn read_cached(&self, path: &PathBuf) -> CoreResult<Arc<String>> {
        if let Some(content) = self.cache.read().await.get(path) {
            return Ok(Arc::clone(content));
        }
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|_| Error::not_found(format!("file {}", path.display())))?;
        let content = Arc::new(raw);
        debug!(path = %path.display(), bytes = content.len(), "Cached document");
        self.cache
            .write()
            .await
            .insert(path.clone(), Arc::clone(&content));
        Ok(content)
    }

    /// All searchable files under the docs tree, as relative paths.
    async fn searchable_files(&self) -> CoreResult<Vec<PathBuf>> {
        let root = self.guard.base_dir().to_path_buf();
        let mut pending = vec![root.clone()];
        let mut found = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut reader = tokio::fs::read_dir(&dir)
                .await
                .map_err(|_| Error::not_found("docs directory".to_string()))?;
            while let Some(entry) = reader.next_entry().await? {
                let path = entry.path();
                let meta = entry.metadata().await?;
                if meta.is_dir() {
                    pending.push(path);
                } else if is_searchable(&path) && meta.len() <= SEARCH_FILE_BYTES_MAX {
                    if let Ok(rel) = path.strip_prefix(&root) {
                        found.push(rel.to_path_buf());
                    }
                }
            }
        }

        found.sort();
        Ok(found)
    }

    async fn search_docs_inner(&self, query: &str, max_results: u32) -> CoreResult<String> {
        let pattern = build_pattern(query)?;
        let max_results = max_results.max(1) as usize;

        let mut sections = Vec::new();
        for rel in self.searchable_files().await? {
            let absolute = self.guard.base_dir().join(&rel);
            let content = match self.read_cached(&absolute).await {
                Ok(content) => content,
                Err(_) => continue,
            };
            let (windows, total) = match_windows(&content, &pattern, max_results);
            if windows.is_empty() {
                continue;
            }

            let mut section = format!("=== {} ===\n{}", rel.display(), windows.join("\n"));
            if total > windows.len() {
                section.push_str(&format!("... and {} more matches\n", total - windows.len()));
            }
            sections.push(section);
        }

        if sections.is_empty() {
            Ok(format!("No matches found for '{}'", query.trim()))
        } else {
            Ok(sections.join("\n"))
        }
    }

    async fn search_file_content_inner(&self, filename: &str, query: &str) -> CoreResult<String> {
        let pattern = build_pattern(query)?;
        let resolved = self.guard.resolve(filename)?;
        let content = self.read_cached(&resolved).await?;

        let (windows, total) = match_windows(&content, &pattern, usize::MAX);
        if windows.is_empty() {
            return Ok(format!("No matches found for '{}' in {filename}", query.trim()));
        }
        let mut result = format!("{total} match(es) in {filename}:\n\n");
        result.push_str(&windows.join("\n"));
        Ok(result)
    }

    async fn list_doc_files_inner(&self) -> CoreResult<String> {
        let files: Vec<String> = self
            .searchable_files()
            .await?
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        Ok(serde_json::to_string_pretty(&files)?)
    }

    async fn get_doc_file_inner(&self, filename: &str) -> CoreResult<String> {
        let resolved = self.guard.resolve(filename)?;
        let content = self.read_cached(&resolved).await?;
        Ok(content.as_ref().clone())
    }
}

#[tool_router]
impl DocsServer {
    #[tool(description = "Search all documentation files for a phrase, with line-numbered context")]
    pub async fn search_docs(&self, Parameters(args): Parameters<SearchDocsArgs>) -> String {
        render(self.search_docs_inner(&args.query, args.max_results).await)
    }

    #[tool(description = "Search one documentation file for a phrase")]
    pub async fn search_file_content(
        &self,
        Parameters(args): Parameters<SearchFileArgs>,
    ) -> String {
        render(
            self.search_file_content_inner(&args.filename, &args.query)
                .await,
        )
    }

    #[tool(description = "List documentation files")]
    pub async fn list_doc_files(&self) -> String {
        render(self.list_doc_files_inner().await)
    }

    #[tool(description = "Read one documentation file")]
    pub async fn get_doc_file(&self, Parameters(args): Parameters<DocFileArgs>) -> String {
        render(self.get_doc_file_inner(&args.filename).await)
    }
}

#[tool_handler]
impl ServerHandler for DocsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "toolbelt-docs".into(),
                title: Some("Toolbelt Documentation Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some("Documentation search over a fixed document tree.".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> (tempfile::TempDir, DocsServer) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("guide.md"),
            "# Guide\n\nalpha line\nbeta line\ngamma line\ndelta line\nepsilon line\n",
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("api")).unwrap();
        std::fs::write(dir.path().join("api/notes.txt"), "alpha again\n").unwrap();
        std::fs::write(dir.path().join("image.png"), [0x89, 0x50]).unwrap();
        let server = DocsServer::new(dir.path());
        (dir, server)
    }

    #[tokio::test]
    async fn test_search_reports_line_windows() {
        let (_dir, server) = docs();
        let result = server.search_docs_inner("beta", 5).await.unwrap();
        assert!(result.contains("=== guide.md ==="));
        // Match on line 4 with 2 lines of context on each side.
        assert!(result.contains("[Lines 2-6]"));
        assert!(result.contains("beta line"));
        assert!(result.contains("delta line"));
        assert!(!result.contains("epsilon line"));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_spans_files() {
        let (_dir, server) = docs();
        let result = server.search_docs_inner("ALPHA", 5).await.unwrap();
        assert!(result.contains("guide.md"));
        assert!(result.contains("api/notes.txt"));
    }

    #[tokio::test]
    async fn test_search_short_query_rejected() {
        let (_dir, server) = docs();
        let result = server.search_docs_inner("ab", 5).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_search_no_matches_message() {
        let (_dir, server) = docs();
        let result = server.search_docs_inner("zzzzzz", 5).await.unwrap();
        assert!(result.contains("No matches found"));
    }

    #[tokio::test]
    async fn test_search_truncates_and_counts_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let many = "needle\n".repeat(8);
        std::fs::write(dir.path().join("many.txt"), many).unwrap();
        let server = DocsServer::new(dir.path());

        let result = server.search_docs_inner("needle", 2).await.unwrap();
        assert!(result.contains("... and 6 more matches"));
    }

    #[tokio::test]
    async fn test_list_skips_unsearchable_extensions() {
        let (_dir, server) = docs();
        let listing = server.list_doc_files_inner().await.unwrap();
        let files: Vec<String> = serde_json::from_str(&listing).unwrap();
        assert_eq!(files, vec!["api/notes.txt".to_string(), "guide.md".to_string()]);
    }

    #[tokio::test]
    async fn test_dotfiles_excluded_from_search_and_listing() {
        let (dir, server) = docs();
        std::fs::write(dir.path().join(".notes.md"), "alpha hidden\n").unwrap();

        let listing = server.list_doc_files_inner().await.unwrap();
        assert!(!listing.contains(".notes.md"));

        let result = server.search_docs_inner("alpha", 5).await.unwrap();
        assert!(!result.contains(".notes.md"));
    }

    #[tokio::test]
    async fn test_get_doc_file_guarded() {
        let (_dir, server) = docs();
        let content = server.get_doc_file_inner("guide.md").await.unwrap();
        assert!(content.starts_with("# Guide"));

        let result = server.get_doc_file_inner("../outside.md").await;
        assert!(matches!(result, Err(Error::InvalidPath { .. })));
    }

    #[tokio::test]
    async fn test_cache_serves_stale_content_after_disk_change() {
        let (dir, server) = docs();
        let first = server.get_doc_file_inner("api/notes.txt").await.unwrap();
        assert_eq!(first, "alpha again\n");

        std::fs::write(dir.path().join("api/notes.txt"), "rewritten\n").unwrap();
        let second = server.get_doc_file_inner("api/notes.txt").await.unwrap();
        // No invalidation: the first read wins for the process lifetime.
        assert_eq!(second, "alpha again\n");
    }

    #[tokio::test]
    async fn test_search_single_file() {
        let (_dir, server) = docs();
        let result = server
            .search_file_content_inner("guide.md", "gamma")
            .await
            .unwrap();
        assert!(result.contains("1 match(es) in guide.md"));
        assert!(result.contains("gamma line"));
    }
}
