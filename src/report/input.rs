//! Commit and issue feed parsing.

use tracing::info;

use crate::error::{Feed, InputError};
use crate::records::{CommitRecord, IssueRecord};

/// Outcome of parsing a commit feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitFeed {
    /// Nothing to report on; the model is never contacted.
    NoActivity,
    Commits(Vec<CommitRecord>),
}

impl CommitFeed {
    pub fn len(&self) -> usize {
        match self {
            CommitFeed::NoActivity => 0,
            CommitFeed::Commits(commits) => commits.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a JSON array of commit objects.
///
/// `[]`, `null` and any array that parses to zero records are all
/// [`CommitFeed::NoActivity`]. Anything that is not a valid array is an error.
pub fn parse_commit_feed(raw: &str) -> Result<CommitFeed, InputError> {
    if raw.trim() == "[]" {
        info!("No commit logs provided in the input JSON. Skipping report generation.");
        return Ok(CommitFeed::NoActivity);
    }

    let commits: Option<Vec<CommitRecord>> =
        serde_json::from_str(raw).map_err(|source| InputError::Malformed {
            feed: Feed::Commits,
            source,
        })?;

    match commits {
        Some(commits) if !commits.is_empty() => Ok(CommitFeed::Commits(commits)),
        _ => {
            info!("No commit logs found after parsing. Skipping report generation.");
            Ok(CommitFeed::NoActivity)
        }
    }
}

/// Parse a JSON array of issue objects. An empty feed is simply empty.
pub fn parse_issue_feed(raw: &str) -> Result<Vec<IssueRecord>, InputError> {
    let issues: Option<Vec<IssueRecord>> =
        serde_json::from_str(raw).map_err(|source| InputError::Malformed {
            feed: Feed::Issues,
            source,
        })?;
    Ok(issues.unwrap_or_default())
}
