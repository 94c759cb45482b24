//! Git history extraction using git2-rs.

pub mod contributors;
pub mod logs;

use std::path::Path;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use git2::{Commit, Repository, Revwalk, Sort};

use crate::error::GitError;

pub use contributors::{Contributor, ContributorOptions, fetch_contributors};
pub use logs::{LogOptions, commit_log_json, fetch_commit_log};

/// Open the repository containing `path`.
pub fn open_repository(path: &Path) -> Result<Repository, GitError> {
    Repository::discover(path).map_err(GitError::OpenRepository)
}

/// Whether `time` falls inside the inclusive `[since, until]` window.
pub fn in_window(
    time: DateTime<Utc>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> bool {
    since.is_none_or(|since| time >= since) && until.is_none_or(|until| time <= until)
}

/// First instant of `date` in local time.
pub fn start_of_local_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    local_instant(date, NaiveTime::MIN)
}

/// Last whole second of `date` in local time, so the day is included in full.
pub fn end_of_local_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59)?;
    local_instant(date, last_second)
}

fn local_instant(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

/// Walk every commit reachable from any reference, oldest first.
///
/// An empty repository yields an empty walk.
pub(crate) fn walk_all_refs(repo: &Repository) -> Result<Revwalk<'_>, GitError> {
    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(Sort::TIME | Sort::REVERSE)
        .map_err(GitError::RevwalkError)?;
    for reference in repo.references().map_err(GitError::RevwalkError)? {
        let reference = reference.map_err(GitError::RevwalkError)?;
        // Refs to non-commit objects (e.g. tagged blobs) are skipped.
        if let Ok(commit) = reference.peel_to_commit() {
            revwalk.push(commit.id()).map_err(GitError::RevwalkError)?;
        }
    }

    // Covers a detached HEAD; an unborn HEAD has nothing to add.
    if let Ok(head) = repo.head().and_then(|head| head.peel_to_commit()) {
        revwalk.push(head.id()).map_err(GitError::RevwalkError)?;
    }

    Ok(revwalk)
}

/// Author time of a commit, keeping the author's UTC offset.
pub(crate) fn author_time(commit: &Commit) -> Result<DateTime<FixedOffset>, GitError> {
    let time = commit.author().when();
    let invalid = || GitError::InvalidTimestamp {
        hash: commit.id().to_string(),
        seconds: time.seconds(),
        offset_minutes: time.offset_minutes(),
    };

    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).ok_or_else(invalid)?;
    offset
        .timestamp_opt(time.seconds(), 0)
        .single()
        .ok_or_else(invalid)
}
