//! GitHub token discovery.
//!
//! Order:
//! 1. `GITHUB_TOKEN` environment variable
//! 2. `GH_TOKEN` environment variable
//! 3. `gh auth token` (gh CLI)

use std::env;
use std::process::Command;

use tracing::debug;

use crate::error::GitHubError;

const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Get a GitHub token from the environment or the gh CLI.
pub fn get_github_token() -> Result<String, GitHubError> {
    token_with(|name| env::var(name).ok(), get_token_from_gh_cli)
}

/// Token discovery with injectable sources. Empty values are ignored.
pub fn token_with<L, C>(lookup: L, cli: C) -> Result<String, GitHubError>
where
    L: Fn(&str) -> Option<String>,
    C: FnOnce() -> Option<String>,
{
    for name in TOKEN_ENV_VARS {
        if let Some(token) = lookup(name).filter(|t| !t.trim().is_empty()) {
            debug!("Using GitHub token from {}", name);
            return Ok(token.trim().to_string());
        }
    }

    if let Some(token) = cli() {
        debug!("Using GitHub token from gh CLI");
        return Ok(token);
    }

    Err(GitHubError::AuthenticationFailed)
}

/// Try to get a token from the gh CLI.
fn get_token_from_gh_cli() -> Option<String> {
    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;

    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}
