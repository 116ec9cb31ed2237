//! GitHub MCP server
//!
//! Direct REST adapter over api.github.com. The bearer token is read from
//! the environment at construction; without it the server still starts, and
//! every tool answers with a not-initialized message instead of crashing.
//!
//! One attempt per call, no retries. Remote errors are rewritten into the
//! text-error convention; responses are reshaped into flatter JSON before
//! being returned.

use crate::fs::render;
use base64::Engine;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars::JsonSchema,
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use toolbelt_core::{Error, Result as CoreResult};
use tracing::debug;

/// GitHub REST API root.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Environment variable holding the bearer token.
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Per-request timeout (30 seconds).
pub const GITHUB_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Files larger than this are refused instead of decoded (1MB).
pub const GITHUB_FILE_BYTES_MAX: u64 = 1_000_000;

fn default_max_count() -> u32 {
    10
}

fn default_branch_count() -> u32 {
    20
}

fn default_state() -> String {
    "open".to_string()
}

fn default_visibility() -> String {
    "all".to_string()
}

fn default_base() -> String {
    "main".to_string()
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct ListReposArgs {
    /// Repository visibility: all, public or private
    #[serde(default = "default_visibility")]
    pub visibility: String,
    /// Maximum number of repositories to return
    #[serde(default = "default_max_count")]
    pub max_count: u32,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct RepoArgs {
    /// Repository in owner/name form
    pub repo: String,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct ListBranchesArgs {
    /// Repository in owner/name form
    pub repo: String,
    /// Maximum number of branches to return
    #[serde(default = "default_branch_count")]
    pub max_count: u32,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct ListRepoFilesArgs {
    /// Repository in owner/name form
    pub repo: String,
    /// Path within the repository (empty for the root)
    #[serde(default)]
    pub path: String,
    /// Branch to read from (repository default when omitted)
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct FileContentArgs {
    /// Repository in owner/name form
    pub repo: String,
    /// File path within the repository
    pub path: String,
    /// Branch to read from (repository default when omitted)
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct WriteRepoFileArgs {
    /// Repository in owner/name form
    pub repo: String,
    /// File path within the repository
    pub path: String,
    /// New file content
    pub content: String,
    /// Commit message
    pub message: String,
    /// Branch to commit to (repository default when omitted)
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct ListIssuesArgs {
    /// Repository in owner/name form
    pub repo: String,
    /// Issue state: open, closed or all
    #[serde(default = "default_state")]
    pub state: String,
    /// Maximum number of issues to return
    #[serde(default = "default_max_count")]
    pub max_count: u32,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct IssueNumberArgs {
    /// Repository in owner/name form
    pub repo: String,
    /// Issue or pull request number
    pub number: u64,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct CreateIssueArgs {
    /// Repository in owner/name form
    pub repo: String,
    /// Issue title
    pub title: String,
    /// Issue body
    #[serde(default)]
    pub body: String,
    /// Labels to attach
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct ListPullRequestsArgs {
    /// Repository in owner/name form
    pub repo: String,
    /// Pull request state: open, closed or all
    #[serde(default = "default_state")]
    pub state: String,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct CreatePullRequestArgs {
    /// Repository in owner/name form
    pub repo: String,
    /// Pull request title
    pub title: String,
    /// Pull request body
    #[serde(default)]
    pub body: String,
    /// Source branch
    pub head: String,
    /// Target branch
    #[serde(default = "default_base")]
    pub base: String,
    /// Open as a draft
    #[serde(default)]
    pub draft: bool,
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct SearchArgs {
    /// Search query (GitHub search syntax)
    pub query: String,
    /// Maximum number of results to return
    #[serde(default = "default_max_count")]
    pub max_count: u32,
}

/// Minimal REST client for api.github.com.
#[derive(Clone)]
struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GithubClient {
    fn new(token: String, api_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(GITHUB_REQUEST_TIMEOUT_MS))
            .user_agent(concat!("toolbelt-github/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_url,
            token,
        }
    }

    fn map_transport_error(e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_ms: GITHUB_REQUEST_TIMEOUT_MS,
            }
        } else {
            Error::external(format!("request failed: {e}"))
        }
    }

    async fn finish(response: reqwest::Response) -> CoreResult<Value> {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(body);
        }
        if status.as_u16() == 404 {
            return Err(Error::not_found(
                body["message"].as_str().unwrap_or("resource").to_string(),
            ));
        }
        let message = body["message"].as_str().unwrap_or("unknown error");
        Err(Error::external(format!(
            "GitHub API Error ({}): {message}",
            status.as_u16()
        )))
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> CoreResult<Value> {
        debug!(path, "GitHub GET");
        let response = self
            .http
            .get(format!("{}{path}", self.api_url))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(Self::map_transport_error)?;
        Self::finish(response).await
    }

    async fn post(&self, path: &str, body: Value) -> CoreResult<Value> {
        debug!(path, "GitHub POST");
        let response = self
            .http
            .post(format!("{}{path}", self.api_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_transport_error)?;
        Self::finish(response).await
    }

    async fn put(&self, path: &str, body: Value) -> CoreResult<Value> {
        debug!(path, "GitHub PUT");
        let response = self
            .http
            .put(format!("{}{path}", self.api_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_transport_error)?;
        Self::finish(response).await
    }
}

/// Flatten a repository object to the fields callers care about.
fn format_repo(repo: &Value) -> Value {
    json!({
        "name": repo["name"],
        "full_name": repo["full_name"],
        "description": repo["description"],
        "private": repo["private"],
        "default_branch": repo["default_branch"],
        "language": repo["language"],
        "stars": repo["stargazers_count"],
        "forks": repo["forks_count"],
        "open_issues": repo["open_issues_count"],
        "url": repo["html_url"],
        "updated_at": repo["updated_at"],
    })
}

/// Flatten an issue object.
fn format_issue(issue: &Value) -> Value {
    let labels: Vec<Value> = issue["labels"]
        .as_array()
        .map(|ls| ls.iter().map(|l| l["name"].clone()).collect())
        .unwrap_or_default();
    json!({
        "number": issue["number"],
        "title": issue["title"],
        "state": issue["state"],
        "author": issue["user"]["login"],
        "labels": labels,
        "comments": issue["comments"],
        "created_at": issue["created_at"],
        "updated_at": issue["updated_at"],
        "body": issue["body"],
        "url": issue["html_url"],
    })
}

/// Flatten a pull request object.
fn format_pull_request(pr: &Value) -> Value {
    json!({
        "number": pr["number"],
        "title": pr["title"],
        "state": pr["state"],
        "author": pr["user"]["login"],
        "head": pr["head"]["ref"],
        "base": pr["base"]["ref"],
        "draft": pr["draft"],
        "merged": pr["merged"],
        "created_at": pr["created_at"],
        "body": pr["body"],
        "url": pr["html_url"],
    })
}

fn pretty(value: &Value) -> CoreResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// MCP server adapting the GitHub REST API.
#[derive(Clone)]
pub struct GithubServer {
    client: Option<GithubClient>,
    tool_router: ToolRouter<Self>,
}

impl GithubServer {
    /// Build with an optional token; `None` produces a server whose tools
    /// all report not-initialized.
    pub fn new(token: Option<String>) -> Self {
        Self::with_api_url(token, GITHUB_API_URL.to_string())
    }

    /// Read the token from `GITHUB_TOKEN`.
    pub fn from_env() -> Self {
        Self::new(std::env::var(ENV_GITHUB_TOKEN).ok())
    }

    pub fn with_api_url(token: Option<String>, api_url: String) -> Self {
        let client = token
            .filter(|t| !t.is_empty())
            .map(|t| GithubClient::new(t, api_url));
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    fn client(&self) -> CoreResult<&GithubClient> {
        self.client.as_ref().ok_or_else(|| Error::NotInitialized {
            reason: format!("GitHub client not configured; set {ENV_GITHUB_TOKEN} and restart"),
        })
    }

    async fn get_contents(&self, repo: &str, path: &str, branch: Option<&str>) -> CoreResult<Value> {
        let client = self.client()?;
        let mut query = Vec::new();
        if let Some(branch) = branch {
            query.push(("ref", branch.to_string()));
        }
        client
            .get(&format!("/repos/{repo}/contents/{path}"), &query)
            .await
    }

    fn decode_content(path: &str, entry: &Value) -> CoreResult<String> {
        if entry.is_array() {
            return Err(Error::invalid_input(format!(
                "{path} is a directory, not a file"
            )));
        }
        let size = entry["size"].as_u64().unwrap_or(0);
        if size > GITHUB_FILE_BYTES_MAX {
            return Err(Error::invalid_input(format!(
                "file {path} is too large ({size} bytes)"
            )));
        }
        let encoded: String = entry["content"]
            .as_str()
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let raw = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| Error::DecodeError {
                path: path.to_string(),
            })?;
        match String::from_utf8(raw) {
            Ok(text) => Ok(text),
            Err(e) => {
                let name = entry["name"].as_str().unwrap_or(path);
                Ok(format!(
                    "Binary file: {name} ({} bytes)",
                    e.as_bytes().len()
                ))
            }
        }
    }
}

#[tool_router]
impl GithubServer {
    #[tool(description = "List repositories for the authenticated user")]
    pub async fn list_repos(&self, Parameters(args): Parameters<ListReposArgs>) -> String {
        let result = async {
            let client = self.client()?;
            let repos = client
                .get(
                    "/user/repos",
                    &[
                        ("visibility", args.visibility.clone()),
                        ("per_page", args.max_count.to_string()),
                        ("sort", "updated".to_string()),
                    ],
                )
                .await?;
            let formatted: Vec<Value> = repos
                .as_array()
                .map(|rs| rs.iter().map(format_repo).collect())
                .unwrap_or_default();
            pretty(&Value::Array(formatted))
        }
        .await;
        render(result)
    }

    #[tool(description = "Get details for one repository")]
    pub async fn get_repo_info(&self, Parameters(args): Parameters<RepoArgs>) -> String {
        let result = async {
            let repo = self
                .client()?
                .get(&format!("/repos/{}", args.repo), &[])
                .await?;
            pretty(&format_repo(&repo))
        }
        .await;
        render(result)
    }

    #[tool(description = "List branches of a repository")]
    pub async fn list_branches(&self, Parameters(args): Parameters<ListBranchesArgs>) -> String {
        let result = async {
            let branches = self
                .client()?
                .get(
                    &format!("/repos/{}/branches", args.repo),
                    &[("per_page", args.max_count.to_string())],
                )
                .await?;
            let formatted: Vec<Value> = branches
                .as_array()
                .map(|bs| {
                    bs.iter()
                        .map(|b| {
                            json!({
                                "name": b["name"],
                                "protected": b["protected"],
                                "sha": b["commit"]["sha"],
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            pretty(&Value::Array(formatted))
        }
        .await;
        render(result)
    }

    #[tool(description = "List files at a path in a repository")]
    pub async fn list_files(&self, Parameters(args): Parameters<ListRepoFilesArgs>) -> String {
        let result = async {
            let contents = self
                .get_contents(&args.repo, &args.path, args.branch.as_deref())
                .await?;
            let mut entries: Vec<Value> = match contents {
                Value::Array(items) => items,
                single => vec![single],
            };
            entries.sort_by(|a, b| {
                let key = |v: &Value| {
                    (
                        v["type"].as_str().unwrap_or("").to_string(),
                        v["name"].as_str().unwrap_or("").to_string(),
                    )
                };
                key(a).cmp(&key(b))
            });
            let formatted: Vec<Value> = entries
                .iter()
                .map(|e| {
                    json!({
                        "name": e["name"],
                        "path": e["path"],
                        "type": e["type"],
                        "size": e["size"],
                    })
                })
                .collect();
            pretty(&Value::Array(formatted))
        }
        .await;
        render(result)
    }

    #[tool(description = "Get the decoded content of a file in a repository")]
    pub async fn get_file_content(&self, Parameters(args): Parameters<FileContentArgs>) -> String {
        let result = async {
            let entry = self
                .get_contents(&args.repo, &args.path, args.branch.as_deref())
                .await?;
            Self::decode_content(&args.path, &entry)
        }
        .await;
        render(result)
    }

    #[tool(description = "Create a new file in a repository; fails if it already exists")]
    pub async fn create_file(&self, Parameters(args): Parameters<WriteRepoFileArgs>) -> String {
        let result = async {
            // Refuse to clobber: existence check first.
            match self
                .get_contents(&args.repo, &args.path, args.branch.as_deref())
                .await
            {
                Ok(_) => {
                    return Err(Error::invalid_input(format!(
                        "file {} already exists; use update_file",
                        args.path
                    )))
                }
                Err(Error::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }

            let mut body = json!({
                "message": args.message,
                "content": base64::engine::general_purpose::STANDARD.encode(&args.content),
            });
            if let Some(branch) = &args.branch {
                body["branch"] = json!(branch);
            }
            let created = self
                .client()?
                .put(&format!("/repos/{}/contents/{}", args.repo, args.path), body)
                .await?;
            Ok(format!(
                "Successfully created {} (commit {})",
                args.path,
                created["commit"]["sha"].as_str().unwrap_or("unknown")
            ))
        }
        .await;
        render(result)
    }

    #[tool(description = "Update an existing file in a repository")]
    pub async fn update_file(&self, Parameters(args): Parameters<WriteRepoFileArgs>) -> String {
        let result = async {
            let existing = self
                .get_contents(&args.repo, &args.path, args.branch.as_deref())
                .await?;
            let sha = existing["sha"]
                .as_str()
                .ok_or_else(|| Error::external("missing blob sha in response".to_string()))?;

            let mut body = json!({
                "message": args.message,
                "content": base64::engine::general_purpose::STANDARD.encode(&args.content),
                "sha": sha,
            });
            if let Some(branch) = &args.branch {
                body["branch"] = json!(branch);
            }
            let updated = self
                .client()?
                .put(&format!("/repos/{}/contents/{}", args.repo, args.path), body)
                .await?;
            Ok(format!(
                "Successfully updated {} (commit {})",
                args.path,
                updated["commit"]["sha"].as_str().unwrap_or("unknown")
            ))
        }
        .await;
        render(result)
    }

    #[tool(description = "List issues of a repository (pull requests excluded)")]
    pub async fn list_issues(&self, Parameters(args): Parameters<ListIssuesArgs>) -> String {
        let result = async {
            let issues = self
                .client()?
                .get(
                    &format!("/repos/{}/issues", args.repo),
                    &[
                        ("state", args.state.clone()),
                        ("per_page", args.max_count.to_string()),
                    ],
                )
                .await?;
            let formatted: Vec<Value> = issues
                .as_array()
                .map(|is| {
                    is.iter()
                        .filter(|i| i["pull_request"].is_null())
                        .map(format_issue)
                        .collect()
                })
                .unwrap_or_default();
            pretty(&Value::Array(formatted))
        }
        .await;
        render(result)
    }

    #[tool(description = "Get one issue by number")]
    pub async fn get_issue(&self, Parameters(args): Parameters<IssueNumberArgs>) -> String {
        let result = async {
            let issue = self
                .client()?
                .get(&format!("/repos/{}/issues/{}", args.repo, args.number), &[])
                .await?;
            if !issue["pull_request"].is_null() {
                return Err(Error::invalid_input(format!(
                    "#{} is a pull request; use get_pull_request",
                    args.number
                )));
            }
            pretty(&format_issue(&issue))
        }
        .await;
        render(result)
    }

    #[tool(description = "Create an issue")]
    pub async fn create_issue(&self, Parameters(args): Parameters<CreateIssueArgs>) -> String {
        let result = async {
            let issue = self
                .client()?
                .post(
                    &format!("/repos/{}/issues", args.repo),
                    json!({
                        "title": args.title,
                        "body": args.body,
                        "labels": args.labels,
                    }),
                )
                .await?;
            pretty(&format_issue(&issue))
        }
        .await;
        render(result)
    }

    #[tool(description = "List pull requests of a repository")]
    pub async fn list_pull_requests(
        &self,
        Parameters(args): Parameters<ListPullRequestsArgs>,
    ) -> String {
        let result = async {
            let prs = self
                .client()?
                .get(
                    &format!("/repos/{}/pulls", args.repo),
                    &[("state", args.state.clone())],
                )
                .await?;
            let formatted: Vec<Value> = prs
                .as_array()
                .map(|ps| ps.iter().map(format_pull_request).collect())
                .unwrap_or_default();
            pretty(&Value::Array(formatted))
        }
        .await;
        render(result)
    }

    #[tool(description = "Get one pull request by number")]
    pub async fn get_pull_request(&self, Parameters(args): Parameters<IssueNumberArgs>) -> String {
        let result = async {
            let pr = self
                .client()?
                .get(&format!("/repos/{}/pulls/{}", args.repo, args.number), &[])
                .await?;
            pretty(&format_pull_request(&pr))
        }
        .await;
        render(result)
    }

    #[tool(description = "Open a pull request")]
    pub async fn create_pull_request(
        &self,
        Parameters(args): Parameters<CreatePullRequestArgs>,
    ) -> String {
        let result = async {
            let pr = self
                .client()?
                .post(
                    &format!("/repos/{}/pulls", args.repo),
                    json!({
                        "title": args.title,
                        "body": args.body,
                        "head": args.head,
                        "base": args.base,
                        "draft": args.draft,
                    }),
                )
                .await?;
            pretty(&format_pull_request(&pr))
        }
        .await;
        render(result)
    }

    #[tool(description = "Search code across GitHub")]
    pub async fn search_code(&self, Parameters(args): Parameters<SearchArgs>) -> String {
        let result = async {
            let found = self
                .client()?
                .get(
                    "/search/code",
                    &[
                        ("q", args.query.clone()),
                        ("per_page", args.max_count.to_string()),
                    ],
                )
                .await?;
            let formatted: Vec<Value> = found["items"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .map(|i| {
                            json!({
                                "name": i["name"],
                                "path": i["path"],
                                "repository": i["repository"]["full_name"],
                                "url": i["html_url"],
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            pretty(&json!({
                "total_count": found["total_count"],
                "items": formatted,
            }))
        }
        .await;
        render(result)
    }

    #[tool(description = "Search repositories across GitHub")]
    pub async fn search_repositories(&self, Parameters(args): Parameters<SearchArgs>) -> String {
        let result = async {
            let found = self
                .client()?
                .get(
                    "/search/repositories",
                    &[
                        ("q", args.query.clone()),
                        ("per_page", args.max_count.to_string()),
                    ],
                )
                .await?;
            let formatted: Vec<Value> = found["items"]
                .as_array()
                .map(|items| items.iter().map(format_repo).collect())
                .unwrap_or_default();
            pretty(&json!({
                "total_count": found["total_count"],
                "items": formatted,
            }))
        }
        .await;
        render(result)
    }
}

#[tool_handler]
impl ServerHandler for GithubServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "toolbelt-github".into(),
                title: Some("Toolbelt GitHub Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some("GitHub REST API access for repositories, issues and pull requests.".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_reports_not_initialized() {
        let server = GithubServer::new(None);
        let text = server
            .get_repo_info(Parameters(RepoArgs {
                repo: "octocat/hello".to_string(),
            }))
            .await;
        assert!(text.starts_with("Error: not initialized"));
        assert!(text.contains("GITHUB_TOKEN"));
    }

    #[tokio::test]
    async fn test_empty_token_treated_as_missing() {
        let server = GithubServer::new(Some(String::new()));
        assert!(server.client().is_err());
    }

    #[test]
    fn test_format_repo_flattens_fields() {
        let raw = json!({
            "name": "hello",
            "full_name": "octocat/hello",
            "description": "demo",
            "private": false,
            "default_branch": "main",
            "language": "Rust",
            "stargazers_count": 42,
            "forks_count": 7,
            "open_issues_count": 3,
            "html_url": "https://github.com/octocat/hello",
            "updated_at": "2024-01-01T00:00:00Z",
            "owner": {"login": "octocat", "id": 1},
        });
        let flat = format_repo(&raw);
        assert_eq!(flat["full_name"], "octocat/hello");
        assert_eq!(flat["stars"], 42);
        assert!(flat.get("owner").is_none());
    }

    #[test]
    fn test_format_issue_collects_label_names() {
        let raw = json!({
            "number": 5,
            "title": "bug",
            "state": "open",
            "user": {"login": "octocat"},
            "labels": [{"name": "bug"}, {"name": "help wanted"}],
            "comments": 2,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "body": "details",
            "html_url": "https://github.com/octocat/hello/issues/5",
        });
        let flat = format_issue(&raw);
        assert_eq!(flat["author"], "octocat");
        assert_eq!(flat["labels"], json!(["bug", "help wanted"]));
    }

    #[test]
    fn test_decode_content_rejects_directory() {
        let entry = json!([{"name": "a"}, {"name": "b"}]);
        let result = GithubServer::decode_content("src", &entry);
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_decode_content_rejects_oversized_file() {
        let entry = json!({"name": "big.bin", "size": GITHUB_FILE_BYTES_MAX + 1, "content": ""});
        let result = GithubServer::decode_content("big.bin", &entry);
        match result {
            Err(Error::InvalidInput { reason }) => assert!(reason.contains("too large")),
            other => panic!("expected too-large rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_content_handles_base64_text() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("hello world\n");
        // GitHub wraps base64 at 60 columns; whitespace must be tolerated.
        let wrapped = format!("{}\n{}", &encoded[..8], &encoded[8..]);
        let entry = json!({"name": "hello.txt", "size": 12, "content": wrapped});
        let text = GithubServer::decode_content("hello.txt", &entry).unwrap();
        assert_eq!(text, "hello world\n");
    }

    #[test]
    fn test_decode_content_reports_binary() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([0xffu8, 0xfe, 0x01]);
        let entry = json!({"name": "blob.bin", "size": 3, "content": encoded});
        let text = GithubServer::decode_content("blob.bin", &entry).unwrap();
        assert_eq!(text, "Binary file: blob.bin (3 bytes)");
    }

    #[test]
    fn test_args_defaults() {
        let args: ListIssuesArgs = serde_json::from_str(r#"{"repo": "o/r"}"#).unwrap();
        assert_eq!(args.state, "open");
        assert_eq!(args.max_count, 10);

        let args: CreatePullRequestArgs =
            serde_json::from_str(r#"{"repo": "o/r", "title": "t", "head": "feature"}"#).unwrap();
        assert_eq!(args.base, "main");
        assert!(!args.draft);
    }
}
