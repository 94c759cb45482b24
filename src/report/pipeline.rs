//! End-to-end report generation: config, credentials, conversation, output.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::GenerationConfig;
use crate::error::ReportError;
use crate::gemini::{ChatBackend, GeminiClient, select_auth};
use crate::records::{CommitRecord, IssueRecord};

use super::driver::{Phase, SessionDriver};
use super::finalize::{NO_ACTIVITY_REPORT, Report, ReportKind, finalize, resolve_content};
use super::input::{CommitFeed, parse_commit_feed};

/// Inputs for one report.
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    /// Raw JSON array of commit objects.
    pub commit_feed: String,
    pub issues: Vec<IssueRecord>,
    /// Write the report here. When `None` the report is only returned.
    pub destination: Option<PathBuf>,
}

/// Generate a report using the config at `config_path` and the Gemini backend.
///
/// Nothing touches the network until the config is valid, a credential has
/// been selected and the commit feed turned out to contain activity.
pub async fn generate_report(
    config_path: &Path,
    request: ReportRequest,
    cancel: CancellationToken,
) -> Result<Report, ReportError> {
    let config = GenerationConfig::load(config_path)?;
    let method = select_auth(&config)?;
    info!("Authenticating with {}", method.describe());

    let commits = match parse_commit_feed(&request.commit_feed)? {
        CommitFeed::NoActivity => return no_activity(&request),
        CommitFeed::Commits(commits) => commits,
    };

    let client = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            return Err(ReportError::Cancelled { phase: Phase::ClientSetup });
        }
        result = GeminiClient::connect(&config, &method) => {
            result.map_err(ReportError::ClientInitialization)?
        }
    };

    converse(&config, commits, &request, client, cancel).await
}

/// Generate a report against an already authenticated backend.
pub async fn generate_report_with_backend<B: ChatBackend>(
    config: &GenerationConfig,
    request: ReportRequest,
    backend: B,
    cancel: CancellationToken,
) -> Result<Report, ReportError> {
    config.validate()?;

    let commits = match parse_commit_feed(&request.commit_feed)? {
        CommitFeed::NoActivity => return no_activity(&request),
        CommitFeed::Commits(commits) => commits,
    };

    converse(config, commits, &request, backend, cancel).await
}

fn no_activity(request: &ReportRequest) -> Result<Report, ReportError> {
    finalize(
        NO_ACTIVITY_REPORT.to_string(),
        ReportKind::NoActivity,
        request.destination.as_deref(),
    )
}

async fn converse<B: ChatBackend>(
    config: &GenerationConfig,
    commits: Vec<CommitRecord>,
    request: &ReportRequest,
    backend: B,
    cancel: CancellationToken,
) -> Result<Report, ReportError> {
    let summary = {
        let mut driver = SessionDriver::open(backend, config.chunk_len(), cancel.clone());
        driver.run(&commits, &request.issues).await?
    };

    info!(
        "Conversation completed: {} commit chunk(s), {} issue chunk(s)",
        summary.commit_turns, summary.issue_turns
    );

    if cancel.is_cancelled() {
        return Err(ReportError::Cancelled {
            phase: Phase::Finalize,
        });
    }

    let (content, kind) = resolve_content(summary.final_response.as_ref());
    finalize(content, kind, request.destination.as_deref())
}
