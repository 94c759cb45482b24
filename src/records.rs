//! Record types shared by the extractors and the report pipeline.
//!
//! Field declaration order is the JSON field order sent to the model, so
//! reordering fields changes the prompts.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One non-merge commit as it appears in the commit feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Author timestamp, keeping the author's UTC offset.
    pub commit_date_time: DateTime<FixedOffset>,
    pub author_name: String,
    pub author_email: String,
    #[serde(rename = "commit_message", default)]
    pub message: String,
    #[serde(default)]
    pub modified_files: Vec<String>,
    /// Any other fields the feed carried. Serialized after the known fields.
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

/// A comment on an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub url: String,
}

/// A tracked issue. `state` is whatever the provider reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: String,
    pub state: String,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

/// Someone who reviewed a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub profile_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A pull request with its discussion and reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub source_branch: String,
    pub target_branch: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    #[serde(default)]
    pub reviewers: Vec<ReviewerRecord>,
}

/// Basic repository metadata from the hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub id: String,
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
