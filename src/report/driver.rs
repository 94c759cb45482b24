//! The multi-turn conversation that turns commit and issue feeds into a report.
//!
//! The driver walks a fixed state graph: instruction, commit chunks, an
//! optional issue phase, then one closing prompt. Every turn is awaited before
//! the next one is sent, and any failure aborts the whole sequence.

use std::fmt;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{GeminiError, ReportError};
use crate::gemini::{ChatBackend, ChatSession, GenerateContentResponse};
use crate::records::{CommitRecord, IssueRecord};

use super::extract::extract_text;
use super::prompts::{INSTRUCTION_PROMPT, ISSUES_TRANSITION_PROMPT, final_prompt};

/// Maximum characters of a diagnostic response written to the debug log.
const DIAGNOSTIC_PREVIEW: usize = 200;

/// Where in the pipeline something happened. Used to tag errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ClientSetup,
    Instruction,
    CommitChunk { index: usize, total: usize },
    IssueTransition,
    IssueChunk { index: usize, total: usize },
    FinalPrompt,
    Finalize,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::ClientSetup => f.write_str("client setup"),
            Phase::Instruction => f.write_str("initial prompt"),
            Phase::CommitChunk { index, total } => write!(f, "commit chunk {}/{}", index, total),
            Phase::IssueTransition => f.write_str("issues introduction message"),
            Phase::IssueChunk { index, total } => write!(f, "issues chunk {}/{}", index, total),
            Phase::FinalPrompt => f.write_str("final prompt"),
            Phase::Finalize => f.write_str("report finalization"),
        }
    }
}

/// States of one report conversation.
///
/// Credential selection and client setup happen before a driver exists, so a
/// driver always starts in `SessionOpen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    SessionOpen,
    InstructionSent,
    CommitsInFlight,
    IssuesIntroduced,
    IssuesInFlight,
    FinalPromptSent,
    Completed,
    Aborted,
}

impl DriverState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DriverState::Completed | DriverState::Aborted)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: DriverState) -> bool {
        use DriverState::*;

        if next == Aborted {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (SessionOpen, InstructionSent)
                | (InstructionSent, CommitsInFlight)
                | (CommitsInFlight, IssuesIntroduced)
                | (CommitsInFlight, FinalPromptSent)
                | (IssuesIntroduced, IssuesInFlight)
                | (IssuesInFlight, FinalPromptSent)
                | (FinalPromptSent, Completed)
        )
    }
}

/// What a completed conversation produced.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub commit_turns: usize,
    pub issue_turns: usize,
    /// Reply to the closing prompt. The only response used as report content.
    pub final_response: Option<GenerateContentResponse>,
    /// Every state the driver passed through, in order.
    pub trail: Vec<DriverState>,
}

/// Number of chunks needed to cover `len` items.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size.max(1))
}

/// Owns the chat session for one report. Dropping the driver releases the
/// session and its backend.
pub struct SessionDriver<B> {
    session: ChatSession<B>,
    chunk_size: usize,
    state: DriverState,
    trail: Vec<DriverState>,
}

impl<B: ChatBackend> SessionDriver<B> {
    /// Open a session on an already authenticated backend.
    pub fn open(backend: B, chunk_size: usize, cancel: CancellationToken) -> Self {
        Self {
            session: ChatSession::new(backend, cancel),
            chunk_size: chunk_size.max(1),
            state: DriverState::SessionOpen,
            trail: vec![DriverState::SessionOpen],
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn trail(&self) -> &[DriverState] {
        &self.trail
    }

    pub fn session(&self) -> &ChatSession<B> {
        &self.session
    }

    /// Run the full conversation. On any error the driver ends in
    /// [`DriverState::Aborted`] and no further turns are sent.
    pub async fn run(
        &mut self,
        commits: &[CommitRecord],
        issues: &[IssueRecord],
    ) -> Result<SessionSummary, ReportError> {
        match self.converse(commits, issues).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                warn!("Report conversation aborted in state {:?}: {}", self.state, e);
                if self.state.can_advance_to(DriverState::Aborted) {
                    self.state = DriverState::Aborted;
                    self.trail.push(DriverState::Aborted);
                }
                Err(e)
            }
        }
    }

    async fn converse(
        &mut self,
        commits: &[CommitRecord],
        issues: &[IssueRecord],
    ) -> Result<SessionSummary, ReportError> {
        if self.state != DriverState::SessionOpen {
            return Err(ReportError::InvalidTransition {
                from: self.state,
                to: DriverState::InstructionSent,
            });
        }

        self.send(Phase::Instruction, INSTRUCTION_PROMPT).await?;
        self.advance(DriverState::InstructionSent)?;

        self.advance(DriverState::CommitsInFlight)?;
        let total = chunk_count(commits.len(), self.chunk_size);
        info!("Sending {} commits in {} chunk(s)", commits.len(), total);
        let commits_response = self
            .send_chunks(commits, |index, total| Phase::CommitChunk { index, total })
            .await?;
        log_diagnostic("commits", commits_response.as_ref());

        let mut issue_turns = 0;
        if !issues.is_empty() {
            self.send(Phase::IssueTransition, ISSUES_TRANSITION_PROMPT)
                .await?;
            self.advance(DriverState::IssuesIntroduced)?;

            self.advance(DriverState::IssuesInFlight)?;
            issue_turns = chunk_count(issues.len(), self.chunk_size);
            info!("Sending {} issues in {} chunk(s)", issues.len(), issue_turns);
            let issues_response = self
                .send_chunks(issues, |index, total| Phase::IssueChunk { index, total })
                .await?;
            log_diagnostic("issues", issues_response.as_ref());
        }

        let final_response = self
            .send(Phase::FinalPrompt, &final_prompt(!issues.is_empty()))
            .await?;
        self.advance(DriverState::FinalPromptSent)?;
        self.advance(DriverState::Completed)?;

        Ok(SessionSummary {
            commit_turns: total,
            issue_turns,
            final_response,
            trail: self.trail.clone(),
        })
    }

    /// Send `items` in contiguous chunks, returning the last reply.
    async fn send_chunks<T, F>(
        &mut self,
        items: &[T],
        phase_of: F,
    ) -> Result<Option<GenerateContentResponse>, ReportError>
    where
        T: Serialize + Sync,
        F: Fn(usize, usize) -> Phase + Send,
    {
        let total = chunk_count(items.len(), self.chunk_size);
        let mut last = None;

        for (i, chunk) in items.chunks(self.chunk_size).enumerate() {
            let phase = phase_of(i + 1, total);
            let payload = serde_json::to_string_pretty(chunk)
                .map_err(|source| ReportError::Serialization { phase, source })?;

            debug!("Sending {} ({} records)", phase, chunk.len());
            last = self.send(phase, &payload).await?;
        }

        Ok(last)
    }

    async fn send(
        &mut self,
        phase: Phase,
        text: &str,
    ) -> Result<Option<GenerateContentResponse>, ReportError> {
        self.session
            .send_message(text)
            .await
            .map_err(|source| match source {
                GeminiError::Cancelled => ReportError::Cancelled { phase },
                source => ReportError::Transmission { phase, source },
            })
    }

    fn advance(&mut self, next: DriverState) -> Result<(), ReportError> {
        if !self.state.can_advance_to(next) {
            return Err(ReportError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!("Session state {:?} -> {:?}", self.state, next);
        self.state = next;
        self.trail.push(next);
        Ok(())
    }
}

fn log_diagnostic(label: &str, response: Option<&GenerateContentResponse>) {
    let text = extract_text(response);
    let preview: String = text.chars().take(DIAGNOSTIC_PREVIEW).collect();
    debug!("Last {} response: {}", label, preview);
}
