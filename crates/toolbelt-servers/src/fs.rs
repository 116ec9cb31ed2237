//! Filesystem MCP server
//!
//! Every operation resolves its path through the shared guard before any
//! filesystem access: traversal attempts and sensitive file patterns are
//! rejected up front. Failures become descriptive text; nothing propagates
//! to the transport.

use chrono::{DateTime, Local};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars::JsonSchema,
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::time::SystemTime;
// The shared Result alias stays qualified here: an unqualified import
// would shadow std's Result inside the generated handler glue.
use toolbelt_core::{Error, PathGuard, Result as CoreResult};
use tracing::debug;

/// Timestamp format used in listings and file info.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a handler result in the text-error convention.
pub(crate) fn render(result: CoreResult<String>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => format!("Error: {e}"),
    }
}

fn format_system_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct PathArgs {
    /// Path relative to the base directory
    pub path: String,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct WriteFileArgs {
    /// Path relative to the base directory
    pub path: String,
    /// Content to write
    pub content: String,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct ListFilesArgs {
    /// Directory relative to the base directory (empty for the base itself)
    #[serde(default)]
    pub directory: String,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct CopyFileArgs {
    /// Source path relative to the base directory
    pub source: String,
    /// Destination path relative to the base directory
    pub destination: String,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct DeleteDirectoryArgs {
    /// Directory relative to the base directory
    pub path: String,
    /// Delete contents as well
    #[serde(default)]
    pub recursive: bool,
}

/// MCP server exposing guarded filesystem operations.
#[derive(Clone)]
pub struct FsServer {
    guard: PathGuard,
    tool_router: ToolRouter<Self>,
}

impl FsServer {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            guard: PathGuard::new(base_dir),
            tool_router: Self::tool_router(),
        }
    }

    async fn read_file_inner(&self, path: &str) -> CoreResult<String> {
        let resolved = self.guard.resolve(path)?;
        let meta = tokio::fs::metadata(&resolved)
            .await
            .map_err(|_| Error::not_found(format!("file {path}")))?;
        if meta.is_dir() {
            return Err(Error::NotAFile {
                path: path.to_string(),
            });
        }
        let raw = tokio::fs::read(&resolved).await?;
        String::from_utf8(raw).map_err(|_| Error::DecodeError {
            path: path.to_string(),
        })
    }

    async fn write_file_inner(&self, path: &str, content: &str) -> CoreResult<String> {
        let resolved = self.guard.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&resolved, content).await?;
        debug!(path = %resolved.display(), bytes = content.len(), "Wrote file");
        Ok(format!("Successfully wrote to {path}"))
    }

    async fn list_files_inner(&self, directory: &str) -> CoreResult<String> {
        let resolved = self.guard.resolve(directory)?;
        let mut reader = tokio::fs::read_dir(&resolved)
            .await
            .map_err(|_| Error::not_found(format!("directory {directory}")))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let meta = entry.metadata().await?;
            let modified = meta
                .modified()
                .map(format_system_time)
                .unwrap_or_default();
            entries.push(json!({
                "name": entry.file_name().to_string_lossy(),
                "type": if meta.is_dir() { "directory" } else { "file" },
                "size": meta.len(),
                "modified": modified,
            }));
        }
        entries.sort_by(|a, b| {
            let key = |v: &serde_json::Value| {
                (
                    v["type"].as_str().unwrap_or("").to_string(),
                    v["name"].as_str().unwrap_or("").to_string(),
                )
            };
            key(a).cmp(&key(b))
        });
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    async fn delete_file_inner(&self, path: &str) -> CoreResult<String> {
        let resolved = self.guard.resolve(path)?;
        let meta = tokio::fs::metadata(&resolved)
            .await
            .map_err(|_| Error::not_found(format!("file {path}")))?;
        if meta.is_dir() {
            return Err(Error::NotAFile {
                path: path.to_string(),
            });
        }
        tokio::fs::remove_file(&resolved).await?;
        Ok(format!("Successfully deleted {path}"))
    }

    async fn copy_file_inner(&self, source: &str, destination: &str) -> CoreResult<String> {
        let from = self.guard.resolve(source)?;
        let to = self.guard.resolve(destination)?;

        let meta = tokio::fs::metadata(&from)
            .await
            .map_err(|_| Error::not_found(format!("file {source}")))?;
        if meta.is_dir() {
            return Err(Error::NotAFile {
                path: source.to_string(),
            });
        }
        if tokio::fs::try_exists(&to).await? {
            return Err(Error::invalid_input(format!(
                "destination {destination} already exists"
            )));
        }
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&from, &to).await?;
        Ok(format!("Successfully copied {source} to {destination}"))
    }

    async fn create_directory_inner(&self, path: &str) -> CoreResult<String> {
        let resolved = self.guard.resolve(path)?;
        match tokio::fs::metadata(&resolved).await {
            Ok(meta) if meta.is_dir() => Ok(format!("Directory {path} already exists")),
            Ok(_) => Err(Error::invalid_input(format!(
                "{path} already exists and is not a directory"
            ))),
            Err(_) => {
                tokio::fs::create_dir_all(&resolved).await?;
                Ok(format!("Successfully created directory {path}"))
            }
        }
    }

    async fn delete_directory_inner(&self, path: &str, recursive: bool) -> CoreResult<String> {
        let resolved = self.guard.resolve(path)?;
        let meta = tokio::fs::metadata(&resolved)
            .await
            .map_err(|_| Error::not_found(format!("directory {path}")))?;
        if !meta.is_dir() {
            return Err(Error::invalid_input(format!("{path} is not a directory")));
        }

        if recursive {
            tokio::fs::remove_dir_all(&resolved).await?;
            return Ok(format!("Successfully deleted directory {path} and its contents"));
        }

        let mut reader = tokio::fs::read_dir(&resolved).await?;
        if reader.next_entry().await?.is_some() {
            return Err(Error::invalid_input(format!(
                "directory {path} is not empty. Use recursive=true to delete it and its contents"
            )));
        }
        tokio::fs::remove_dir(&resolved).await?;
        Ok(format!("Successfully deleted directory {path}"))
    }

    async fn file_info_inner(&self, path: &str) -> CoreResult<String> {
        let resolved = self.guard.resolve(path)?;
        let meta = tokio::fs::metadata(&resolved)
            .await
            .map_err(|_| Error::not_found(format!("path {path}")))?;

        let name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());
        let timestamps = |t: std::io::Result<SystemTime>| t.map(format_system_time).unwrap_or_default();

        let info = json!({
            "name": name,
            "path": path,
            "type": if meta.is_dir() { "directory" } else { "file" },
            "size": meta.len(),
            "created": timestamps(meta.created()),
            "modified": timestamps(meta.modified()),
            "accessed": timestamps(meta.accessed()),
        });
        Ok(serde_json::to_string_pretty(&info)?)
    }

    #[cfg(test)]
    pub(crate) fn base_dir(&self) -> &std::path::Path {
        self.guard.base_dir()
    }
}

#[tool_router]
impl FsServer {
    #[tool(description = "Read a text file from the base directory")]
    pub async fn read_file(&self, Parameters(args): Parameters<PathArgs>) -> String {
        render(self.read_file_inner(&args.path).await)
    }

    #[tool(description = "Write content to a file, creating parent directories as needed")]
    pub async fn write_file(&self, Parameters(args): Parameters<WriteFileArgs>) -> String {
        render(self.write_file_inner(&args.path, &args.content).await)
    }

    #[tool(description = "List files and directories with size and modification time")]
    pub async fn list_files(&self, Parameters(args): Parameters<ListFilesArgs>) -> String {
        render(self.list_files_inner(&args.directory).await)
    }

    #[tool(description = "Delete a file")]
    pub async fn delete_file(&self, Parameters(args): Parameters<PathArgs>) -> String {
        render(self.delete_file_inner(&args.path).await)
    }

    #[tool(description = "Copy a file to a new location; fails if the destination exists")]
    pub async fn copy_file(&self, Parameters(args): Parameters<CopyFileArgs>) -> String {
        render(self.copy_file_inner(&args.source, &args.destination).await)
    }

    #[tool(description = "Create a directory, including parents")]
    pub async fn create_directory(&self, Parameters(args): Parameters<PathArgs>) -> String {
        render(self.create_directory_inner(&args.path).await)
    }

    #[tool(description = "Delete a directory; non-empty directories require recursive=true")]
    pub async fn delete_directory(&self, Parameters(args): Parameters<DeleteDirectoryArgs>) -> String {
        render(self.delete_directory_inner(&args.path, args.recursive).await)
    }

    #[tool(description = "Get size, type and timestamps for a file or directory")]
    pub async fn file_info(&self, Parameters(args): Parameters<PathArgs>) -> String {
        render(self.file_info_inner(&args.path).await)
    }
}

#[tool_handler]
impl ServerHandler for FsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "toolbelt-fs".into(),
                title: Some("Toolbelt Filesystem Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Filesystem operations confined to a configured base directory.".into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> (tempfile::TempDir, FsServer) {
        let dir = tempfile::tempdir().unwrap();
        let server = FsServer::new(dir.path());
        (dir, server)
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let (_dir, server) = server();
        let written = server
            .write_file_inner("notes/hello.txt", "line one\nline two\n")
            .await
            .unwrap();
        assert!(written.contains("Successfully wrote"));

        let content = server.read_file_inner("notes/hello.txt").await.unwrap();
        assert_eq!(content, "line one\nline two\n");
    }

    #[tokio::test]
    async fn test_read_missing_file_not_found() {
        let (_dir, server) = server();
        let result = server.read_file_inner("missing.txt").await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_read_directory_is_not_a_file() {
        let (_dir, server) = server();
        server.create_directory_inner("sub").await.unwrap();
        let result = server.read_file_inner("sub").await;
        assert!(matches!(result, Err(Error::NotAFile { .. })));
    }

    #[tokio::test]
    async fn test_read_non_utf8_is_decode_error() {
        let (dir, server) = server();
        std::fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00, 0x01]).unwrap();
        let result = server.read_file_inner("blob.bin").await;
        assert!(matches!(result, Err(Error::DecodeError { .. })));
    }

    #[tokio::test]
    async fn test_sensitive_file_denied_without_touching_fs() {
        let (_dir, server) = server();
        let result = server.read_file_inner("secrets/.env").await;
        assert!(matches!(result, Err(Error::AccessDenied { .. })));
        // Nothing under the base directory was created by the attempt.
        assert!(!server.base_dir().join("secrets").exists());
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (_dir, server) = server();
        let result = server.read_file_inner("../../etc/passwd").await;
        assert!(matches!(result, Err(Error::InvalidPath { .. })));
    }

    #[tokio::test]
    async fn test_list_empty_base_is_empty_listing() {
        let (_dir, server) = server();
        let listing = server.list_files_inner("").await.unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&listing).unwrap();
        assert!(parsed.is_empty());
    }

    #[tokio::test]
    async fn test_list_files_reports_entries() {
        let (_dir, server) = server();
        server.write_file_inner("a.txt", "abc").await.unwrap();
        server.create_directory_inner("sub").await.unwrap();

        let listing = server.list_files_inner("").await.unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&listing).unwrap();
        assert_eq!(parsed.len(), 2);
        // Directories sort before files.
        assert_eq!(parsed[0]["name"], "sub");
        assert_eq!(parsed[0]["type"], "directory");
        assert_eq!(parsed[1]["name"], "a.txt");
        assert_eq!(parsed[1]["size"], 3);
    }

    #[tokio::test]
    async fn test_copy_refuses_existing_destination() {
        let (_dir, server) = server();
        server.write_file_inner("src.txt", "source").await.unwrap();
        server.write_file_inner("dst.txt", "existing").await.unwrap();

        let result = server.copy_file_inner("src.txt", "dst.txt").await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        // Destination untouched.
        let content = server.read_file_inner("dst.txt").await.unwrap();
        assert_eq!(content, "existing");
    }

    #[tokio::test]
    async fn test_copy_creates_destination_parents() {
        let (_dir, server) = server();
        server.write_file_inner("src.txt", "source").await.unwrap();
        server
            .copy_file_inner("src.txt", "nested/deep/dst.txt")
            .await
            .unwrap();
        let content = server.read_file_inner("nested/deep/dst.txt").await.unwrap();
        assert_eq!(content, "source");
    }

    #[tokio::test]
    async fn test_delete_non_empty_directory_needs_recursive() {
        let (_dir, server) = server();
        server.write_file_inner("sub/file.txt", "x").await.unwrap();

        let result = server.delete_directory_inner("sub", false).await;
        match result {
            Err(Error::InvalidInput { reason }) => assert!(reason.contains("not empty")),
            other => panic!("expected not-empty error, got {other:?}"),
        }
        assert!(server.base_dir().join("sub").exists());

        server.delete_directory_inner("sub", true).await.unwrap();
        assert!(!server.base_dir().join("sub").exists());
    }

    #[tokio::test]
    async fn test_create_directory_idempotent_message() {
        let (_dir, server) = server();
        server.create_directory_inner("sub").await.unwrap();
        let again = server.create_directory_inner("sub").await.unwrap();
        assert!(again.contains("already exists"));
    }

    #[tokio::test]
    async fn test_create_directory_over_file_fails() {
        let (_dir, server) = server();
        server.write_file_inner("taken", "x").await.unwrap();
        let result = server.create_directory_inner("taken").await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_file_info_shape() {
        let (_dir, server) = server();
        server.write_file_inner("info.txt", "12345").await.unwrap();
        let info = server.file_info_inner("info.txt").await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&info).unwrap();
        assert_eq!(parsed["name"], "info.txt");
        assert_eq!(parsed["type"], "file");
        assert_eq!(parsed["size"], 5);
        assert!(parsed["modified"].as_str().is_some());
    }

    #[test]
    fn test_get_info_advertises_tools() {
        let (_dir, server) = server();
        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "toolbelt-fs");
    }

    #[tokio::test]
    async fn test_render_error_convention() {
        let (_dir, server) = server();
        let text = server
            .read_file(Parameters(PathArgs {
                path: "secrets/.env".to_string(),
            }))
            .await;
        assert!(text.starts_with("Error: access denied"));
    }
}
