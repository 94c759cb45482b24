//! repo-pulse - weekly activity reports for git repositories.
//!
//! # Overview
//!
//! repo-pulse extracts commit history (and optionally issues from GitHub),
//! streams it to a Gemini model over one multi-turn conversation, and writes
//! the resulting Markdown status report.

pub mod config;
pub mod error;
pub mod gemini;
pub mod git;
pub mod github;
pub mod records;
pub mod report;

// Re-export commonly used types
pub use config::{DEFAULT_CONFIG_PATH, GenerationConfig};
pub use error::{AuthError, ConfigError, GeminiError, GitError, GitHubError, InputError, ReportError};
pub use records::{CommentRecord, CommitRecord, IssueRecord, PullRequestRecord, RepositoryRecord, ReviewerRecord};
pub use report::{Report, ReportKind, ReportRequest, generate_report};
