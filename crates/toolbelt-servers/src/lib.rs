//! The toolbelt MCP servers
//!
//! Six independent tool-servers, each a thin adapter translating one
//! external capability into the MCP tool-call convention:
//! - **fs**: filesystem operations confined to a base directory
//! - **git**: git subcommands scoped to a repository root
//! - **github**: GitHub REST API access
//! - **exec**: sandboxed Python execution with persisted records
//! - **imagegen**: Stable Diffusion webui adapter
//! - **docs**: documentation search over a fixed tree
//!
//! Each server ships as its own binary (see `src/bin/`) and picks its
//! transport (stdio or HTTP/SSE) from the command line.

pub mod docs;
pub mod exec;
pub mod fs;
pub mod git;
pub mod github;
pub mod imagegen;

pub use docs::DocsServer;
pub use exec::ExecServer;
pub use fs::FsServer;
pub use git::GitServer;
pub use github::GithubServer;
pub use imagegen::{ImageGenConfig, ImageGenServer};
