//! GitHub issue and pull request access using octocrab.

pub mod auth;
pub mod provider;
pub mod remote;

pub use auth::get_github_token;
pub use provider::{GitHubProvider, MAX_BODY_LENGTH, RepositoryProvider, truncate_body};
pub use remote::{RepoSlug, origin_slug, parse_remote_url};
