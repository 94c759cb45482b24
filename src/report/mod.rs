//! Activity report generation.
//!
//! A commit feed (and optionally an issue feed) is streamed to the model in
//! chunks over one conversation, then the model is asked for a Markdown
//! report which is written out or returned.

pub mod driver;
pub mod extract;
pub mod finalize;
pub mod input;
pub mod pipeline;
pub mod prompts;

pub use driver::{DriverState, Phase, SessionDriver, SessionSummary, chunk_count};
pub use extract::extract_text;
pub use finalize::{
    EXTRACTION_FAILED_REPORT, NO_ACTIVITY_REPORT, NO_RESPONSE_REPORT, Report, ReportKind,
    resolve_content, write_atomic,
};
pub use input::{CommitFeed, parse_commit_feed, parse_issue_feed};
pub use pipeline::{ReportRequest, generate_report, generate_report_with_backend};
