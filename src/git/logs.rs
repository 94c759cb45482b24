//! Commit feed extraction.

use chrono::{DateTime, Utc};
use git2::{Commit, Repository};
use tracing::{debug, info};

use crate::error::GitError;
use crate::records::CommitRecord;

use super::{author_time, in_window, walk_all_refs};

/// Time window for the commit feed. Both bounds are inclusive.
///
/// Bounds apply to the author timestamp, not the committer date that
/// `git log --after/--before` filters on. The two differ for rebased or
/// amended commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

/// Collect non-merge commits from every reference, oldest first.
///
/// Commits that touch no files are left out.
pub fn fetch_commit_log(
    repo: &Repository,
    options: &LogOptions,
) -> Result<Vec<CommitRecord>, GitError> {
    let revwalk = walk_all_refs(repo)?;
    let mut records = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(GitError::RevwalkError)?;
        let commit = repo.find_commit(oid).map_err(GitError::ParseCommit)?;

        if commit.parent_count() > 1 {
            continue;
        }

        let commit_date_time = author_time(&commit)?;
        if !in_window(commit_date_time.with_timezone(&Utc), options.since, options.until) {
            continue;
        }

        let modified_files = changed_files(repo, &commit)?;
        if modified_files.is_empty() {
            debug!("Skipping commit {} with no changed files", oid);
            continue;
        }

        let author = commit.author();
        records.push(CommitRecord {
            commit_date_time,
            author_name: author.name().unwrap_or_default().to_string(),
            author_email: author.email().unwrap_or_default().to_string(),
            message: String::from_utf8_lossy(commit.message_bytes()).trim().to_string(),
            modified_files,
            extra: Default::default(),
        });
    }

    info!("Collected {} commits", records.len());
    Ok(records)
}

/// Render a commit feed as the pretty JSON array the report pipeline reads.
pub fn commit_log_json(records: &[CommitRecord]) -> Result<String, GitError> {
    if records.is_empty() {
        return Ok("[]".to_string());
    }
    serde_json::to_string_pretty(records).map_err(GitError::Serialize)
}

/// Paths changed relative to the first parent (or the empty tree), sorted.
fn changed_files(repo: &Repository, commit: &Commit) -> Result<Vec<String>, GitError> {
    let diff_error = |source| GitError::DiffFailed {
        hash: commit.id().to_string(),
        source,
    };

    let tree = commit.tree().map_err(diff_error)?;
    let parent_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree().map_err(diff_error)?),
        Err(_) => None,
    };

    let diff = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
        .map_err(diff_error)?;

    let mut files: Vec<String> = diff
        .deltas()
        .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    files.sort();
    files.dedup();

    Ok(files)
}
