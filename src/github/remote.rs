//! Owner and repository name from a git remote.

use std::fmt;

use git2::Repository;

use crate::error::GitHubError;

/// `owner/name` of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse a remote URL in SSH (`git@host:owner/repo.git`,
/// `ssh://git@host/owner/repo.git`) or HTTPS (`https://host/owner/repo(.git)`) form.
pub fn parse_remote_url(url: &str) -> Result<RepoSlug, GitHubError> {
    let url = url.trim();
    let invalid = || GitHubError::InvalidRepositoryUrl(url.to_string());

    let path = if let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.strip_prefix("ssh://"))
    {
        // Drop the host (and any credentials in front of it).
        rest.split_once('/').map(|(_, path)| path).ok_or_else(invalid)?
    } else if let Some((user_host, path)) = url.split_once(':') {
        if !user_host.contains('@') {
            return Err(invalid());
        }
        path
    } else {
        return Err(invalid());
    };

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/').filter(|p| !p.is_empty());

    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) => Ok(RepoSlug::new(owner, name)),
        _ => Err(invalid()),
    }
}

/// Slug of the repository's `origin` remote.
pub fn origin_slug(repo: &Repository) -> Result<RepoSlug, GitHubError> {
    let remote = repo
        .find_remote("origin")
        .map_err(|_| GitHubError::NoOriginRemote)?;
    let url = remote.url().ok_or(GitHubError::NoOriginRemote)?;
    parse_remote_url(url)
}
