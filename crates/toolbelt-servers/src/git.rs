//! Git MCP server
//!
//! Translates a fixed set of named operations into invocations of the
//! external `git` binary, scoped to a configured repository root. An
//! optional subpath narrows the working directory; it resolves through the
//! shared guard so the same traversal invariant applies everywhere.
//!
//! The generalized `git_execute` tool enforces an allow-list of subcommands
//! and rejects shell metacharacters before tokenizing; both checks happen
//! before any process is spawned.

use crate::fs::render;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars::JsonSchema,
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use toolbelt_core::{Error, PathGuard, Result as CoreResult};
use tracing::debug;

/// Subcommands `git_execute` is allowed to run.
pub const GIT_ALLOWED_COMMANDS: &[&str] = &[
    "version", "status", "log", "add", "commit", "branch", "checkout", "init", "diff", "show",
    "remote", "fetch", "config", "tag", "ls-files",
];

/// Metacharacters rejected in file patterns and branch names.
const ARG_METACHARACTERS: &[char] = &[';', '&', '|'];

/// Metacharacters rejected anywhere in a `git_execute` command line.
const EXECUTE_METACHARACTERS: &[char] = &[';', '&', '|', '`', '$'];

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct SubpathArgs {
    /// Optional subfolder relative to the repository root
    #[serde(default)]
    pub subpath: Option<String>,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct GitLogArgs {
    /// Number of commits to show
    #[serde(default = "default_log_count")]
    pub n: u32,
    /// Optional subfolder relative to the repository root
    #[serde(default)]
    pub subpath: Option<String>,
}

fn default_log_count() -> u32 {
    10
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct GitAddArgs {
    /// File pattern to add (".", "*.py", "file.txt")
    pub files: String,
    /// Optional subfolder relative to the repository root
    #[serde(default)]
    pub subpath: Option<String>,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct GitCommitArgs {
    /// Commit message
    pub message: String,
    /// Optional subfolder relative to the repository root
    #[serde(default)]
    pub subpath: Option<String>,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct GitCheckoutArgs {
    /// Branch to check out or file to restore
    pub target: String,
    /// Optional subfolder relative to the repository root
    #[serde(default)]
    pub subpath: Option<String>,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct GitDiffArgs {
    /// Optional specific files to diff
    #[serde(default)]
    pub files: Option<String>,
    /// Optional subfolder relative to the repository root
    #[serde(default)]
    pub subpath: Option<String>,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct GitExecuteArgs {
    /// Git command line without the leading "git" ("log -n5", "status -s")
    pub command: String,
    /// Optional subfolder relative to the repository root
    #[serde(default)]
    pub subpath: Option<String>,
}

/// MCP server wrapping the external git binary.
#[derive(Clone)]
pub struct GitServer {
    guard: PathGuard,
    tool_router: ToolRouter<Self>,
}

impl GitServer {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        // No denied file patterns here: the guard only scopes working
        // directories, it is not mediating file content access.
        let guard = PathGuard::new(repo_root).with_denied_patterns(Vec::new());
        Self {
            guard,
            tool_router: Self::tool_router(),
        }
    }

    /// Resolve the working directory for a command, which must exist.
    fn resolve_workdir(&self, subpath: Option<&str>) -> CoreResult<PathBuf> {
        let workdir = match subpath {
            None | Some("") => self.guard.base_dir().to_path_buf(),
            Some(sub) => self.guard.resolve(sub)?,
        };
        if !workdir.is_dir() {
            return Err(Error::not_found(format!(
                "path {}",
                subpath.unwrap_or_default()
            )));
        }
        Ok(workdir)
    }

    async fn run_git(
        &self,
        command: &str,
        args: &[String],
        subpath: Option<&str>,
    ) -> CoreResult<String> {
        let workdir = self.resolve_workdir(subpath)?;
        debug!(command, workdir = %workdir.display(), "Running git");

        let output = Command::new("git")
            .arg(command)
            .args(args)
            .current_dir(&workdir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::external(format!("failed to run git: {e}")))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            // Non-zero exits surface as formatted text, not an error class.
            Ok(format!("Error (code {code}): {stderr}"))
        }
    }

    fn check_argument(value: &str, what: &str) -> CoreResult<()> {
        if value.contains(ARG_METACHARACTERS) {
            return Err(Error::invalid_input(format!("invalid {what}: {value}")));
        }
        Ok(())
    }

    /// Validate and tokenize a `git_execute` command line. Pure; nothing is
    /// spawned until this passes.
    fn parse_execute_command(command: &str) -> CoreResult<(String, Vec<String>)> {
        if command.contains(EXECUTE_METACHARACTERS) || command.contains("..") {
            return Err(Error::invalid_input(
                "potentially unsafe command detected".to_string(),
            ));
        }

        let mut parts = command.split_whitespace();
        let subcommand = parts
            .next()
            .ok_or_else(|| Error::invalid_input("empty command".to_string()))?;

        if !GIT_ALLOWED_COMMANDS.contains(&subcommand) {
            return Err(Error::invalid_input(format!(
                "command '{subcommand}' is not allowed"
            )));
        }

        Ok((
            subcommand.to_string(),
            parts.map(|s| s.to_string()).collect(),
        ))
    }

    async fn list_subfolders_inner(&self) -> CoreResult<String> {
        let root = self.guard.base_dir().to_path_buf();
        let mut pending = vec![root.clone()];
        let mut found = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut reader = tokio::fs::read_dir(&dir)
                .await
                .map_err(|_| Error::not_found("repository root".to_string()))?;
            while let Some(entry) = reader.next_entry().await? {
                if entry.metadata().await?.is_dir() {
                    let path = entry.path();
                    if let Ok(rel) = path.strip_prefix(&root) {
                        found.push(rel.to_string_lossy().into_owned());
                    }
                    pending.push(path);
                }
            }
        }

        found.sort();
        if found.is_empty() {
            Ok("No subfolders found.".to_string())
        } else {
            Ok(found.join("\n"))
        }
    }
}

#[tool_router]
impl GitServer {
    #[tool(description = "Get the installed git version")]
    pub async fn git_version(&self) -> String {
        render(self.run_git("version", &[], None).await)
    }

    #[tool(description = "Show the working tree status")]
    pub async fn git_status(&self, Parameters(args): Parameters<SubpathArgs>) -> String {
        render(self.run_git("status", &[], args.subpath.as_deref()).await)
    }

    #[tool(description = "Show recent commits, one line each")]
    pub async fn git_log(&self, Parameters(args): Parameters<GitLogArgs>) -> String {
        let flags = vec![format!("-n{}", args.n), "--oneline".to_string()];
        render(self.run_git("log", &flags, args.subpath.as_deref()).await)
    }

    #[tool(description = "Add file contents to the index")]
    pub async fn git_add(&self, Parameters(args): Parameters<GitAddArgs>) -> String {
        let result = match Self::check_argument(&args.files, "file pattern") {
            Ok(()) => {
                self.run_git("add", &[args.files.clone()], args.subpath.as_deref())
                    .await
            }
            Err(e) => Err(e),
        };
        render(result)
    }

    #[tool(description = "Record changes to the repository")]
    pub async fn git_commit(&self, Parameters(args): Parameters<GitCommitArgs>) -> String {
        let flags = vec!["-m".to_string(), args.message.clone()];
        render(self.run_git("commit", &flags, args.subpath.as_deref()).await)
    }

    #[tool(description = "List branches")]
    pub async fn git_branch(&self, Parameters(args): Parameters<SubpathArgs>) -> String {
        render(self.run_git("branch", &[], args.subpath.as_deref()).await)
    }

    #[tool(description = "Switch branches or restore working tree files")]
    pub async fn git_checkout(&self, Parameters(args): Parameters<GitCheckoutArgs>) -> String {
        let result = match Self::check_argument(&args.target, "branch or file name") {
            Ok(()) => {
                self.run_git("checkout", &[args.target.clone()], args.subpath.as_deref())
                    .await
            }
            Err(e) => Err(e),
        };
        render(result)
    }

    #[tool(description = "Show files in the index and the working tree")]
    pub async fn git_ls_files(&self, Parameters(args): Parameters<SubpathArgs>) -> String {
        render(self.run_git("ls-files", &[], args.subpath.as_deref()).await)
    }

    #[tool(description = "Show changes between commits, commit and working tree, etc")]
    pub async fn git_diff(&self, Parameters(args): Parameters<GitDiffArgs>) -> String {
        let flags: Vec<String> = args.files.clone().into_iter().collect();
        render(self.run_git("diff", &flags, args.subpath.as_deref()).await)
    }

    #[tool(description = "Run an allow-listed git command with arguments")]
    pub async fn git_execute(&self, Parameters(args): Parameters<GitExecuteArgs>) -> String {
        let result = match Self::parse_execute_command(&args.command) {
            Ok((subcommand, flags)) => {
                self.run_git(&subcommand, &flags, args.subpath.as_deref())
                    .await
            }
            Err(e) => Err(e),
        };
        render(result)
    }

    #[tool(description = "List all subfolders of the repository")]
    pub async fn list_subfolders(&self) -> String {
        render(self.list_subfolders_inner().await)
    }
}

#[tool_handler]
impl ServerHandler for GitServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "toolbelt-git".into(),
                title: Some("Toolbelt Git Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some("Git operations scoped to a configured repository root.".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_rejects_metacharacters() {
        for command in ["status; rm -rf /", "log && whoami", "diff | tee", "show `id`", "tag $X"] {
            let result = GitServer::parse_execute_command(command);
            assert!(
                matches!(result, Err(Error::InvalidInput { .. })),
                "{command} should be rejected"
            );
        }
    }

    #[test]
    fn test_execute_rejects_traversal_marker() {
        let result = GitServer::parse_execute_command("log ../outside");
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_execute_rejects_disallowed_subcommand() {
        let result = GitServer::parse_execute_command("push origin main");
        match result {
            Err(Error::InvalidInput { reason }) => assert!(reason.contains("push")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_execute_rejects_empty_command() {
        assert!(GitServer::parse_execute_command("   ").is_err());
    }

    #[test]
    fn test_execute_tokenizes_allowed_command() {
        let (subcommand, args) = GitServer::parse_execute_command("log -n5 --oneline").unwrap();
        assert_eq!(subcommand, "log");
        assert_eq!(args, vec!["-n5".to_string(), "--oneline".to_string()]);
    }

    #[test]
    fn test_argument_metacharacter_rejection() {
        assert!(GitServer::check_argument("file.txt; rm", "file pattern").is_err());
        assert!(GitServer::check_argument("a|b", "file pattern").is_err());
        assert!(GitServer::check_argument("*.py", "file pattern").is_ok());
    }

    #[test]
    fn test_workdir_rejects_escape() {
        let server = GitServer::new("/repo");
        let result = server.resolve_workdir(Some("../elsewhere"));
        assert!(matches!(result, Err(Error::InvalidPath { .. })));

        let result = server.resolve_workdir(Some("/absolute"));
        assert!(matches!(result, Err(Error::InvalidPath { .. })));
    }

    #[test]
    fn test_workdir_requires_existing_subpath() {
        let dir = tempfile::tempdir().unwrap();
        let server = GitServer::new(dir.path());
        let result = server.resolve_workdir(Some("missing"));
        assert!(matches!(result, Err(Error::NotFound { .. })));

        std::fs::create_dir(dir.path().join("present")).unwrap();
        let resolved = server.resolve_workdir(Some("present")).unwrap();
        assert_eq!(resolved, dir.path().join("present"));
    }

    #[tokio::test]
    async fn test_list_subfolders_walks_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        std::fs::create_dir(dir.path().join("c")).unwrap();

        let server = GitServer::new(dir.path());
        let listing = server.list_subfolders_inner().await.unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines, vec!["a", "a/b", "c"]);
    }

    #[tokio::test]
    async fn test_list_subfolders_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let server = GitServer::new(dir.path());
        let listing = server.list_subfolders_inner().await.unwrap();
        assert_eq!(listing, "No subfolders found.");
    }
}
