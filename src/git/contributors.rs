//! Per-author commit summary.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use git2::Repository;
use serde::Serialize;

use crate::error::GitError;

use super::{author_time, in_window, walk_all_refs};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContributorOptions {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub include_merges: bool,
}

/// One author and their activity in the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contributor {
    pub name: String,
    pub email: String,
    pub commits: usize,
    pub first_commit: DateTime<Utc>,
    pub last_commit: DateTime<Utc>,
}

/// Summarize commit authors across every reference.
///
/// Authors are matched on `name <email>` ignoring case; the first spelling
/// seen is the one reported.
pub fn fetch_contributors(
    repo: &Repository,
    options: &ContributorOptions,
) -> Result<Vec<Contributor>, GitError> {
    let revwalk = walk_all_refs(repo)?;
    let mut by_key: HashMap<String, Contributor> = HashMap::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(GitError::RevwalkError)?;
        let commit = repo.find_commit(oid).map_err(GitError::ParseCommit)?;

        if !options.include_merges && commit.parent_count() > 1 {
            continue;
        }

        let when = author_time(&commit)?.with_timezone(&Utc);
        if !in_window(when, options.since, options.until) {
            continue;
        }

        let author = commit.author();
        let name = author.name().unwrap_or_default().trim();
        let email = author.email().unwrap_or_default().trim();
        if name.is_empty() && email.is_empty() {
            continue;
        }

        let key = format!("{}<{}>", name, email).to_lowercase();
        by_key
            .entry(key)
            .and_modify(|c| {
                c.commits += 1;
                c.first_commit = c.first_commit.min(when);
                c.last_commit = c.last_commit.max(when);
            })
            .or_insert_with(|| Contributor {
                name: name.to_string(),
                email: email.to_string(),
                commits: 1,
                first_commit: when,
                last_commit: when,
            });
    }

    let mut contributors: Vec<Contributor> = by_key.into_values().collect();
    contributors.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.email.to_lowercase().cmp(&b.email.to_lowercase()))
    });

    Ok(contributors)
}
