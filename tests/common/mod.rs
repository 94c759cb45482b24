//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};
use git2::{Oid, Repository, Signature, Time};
use tokio_util::sync::CancellationToken;

use repo_pulse::GenerationConfig;
use repo_pulse::error::GeminiError;
use repo_pulse::gemini::{Candidate, ChatBackend, Content, GenerateContentResponse, Part};
use repo_pulse::records::{CommitRecord, IssueRecord};

/// Create a temporary directory for test output.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// A test git repository builder for integration tests.
///
/// Commits are built directly from trees, so files live at the top level
/// and the working directory is never touched.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

/// Author of a test commit.
#[derive(Clone, Copy)]
pub struct Author<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

pub const ADA: Author<'static> = Author {
    name: "Ada Lovelace",
    email: "ada@example.com",
};

pub const GRACE: Author<'static> = Author {
    name: "Grace Hopper",
    email: "grace@example.com",
};

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    /// Commit `files` (name, content) on top of HEAD as `author` at `seconds`
    /// since the epoch (UTC). Returns the commit OID.
    pub fn commit(&self, author: Author, seconds: i64, message: &str, files: &[(&str, &str)]) -> Oid {
        let parent = self.head();
        self.commit_on("HEAD", parent, author, seconds, 0, message, files)
    }

    /// Like [`TestRepo::commit`] but with an explicit UTC offset in minutes.
    pub fn commit_with_offset(
        &self,
        author: Author,
        seconds: i64,
        offset_minutes: i32,
        message: &str,
        files: &[(&str, &str)],
    ) -> Oid {
        let parent = self.head();
        self.commit_on("HEAD", parent, author, seconds, offset_minutes, message, files)
    }

    /// Commit on `refs/heads/<branch>` without moving HEAD.
    pub fn commit_on_branch(
        &self,
        branch: &str,
        author: Author,
        seconds: i64,
        message: &str,
        files: &[(&str, &str)],
    ) -> Oid {
        let refname = format!("refs/heads/{}", branch);
        let parent = self
            .repo
            .refname_to_id(&refname)
            .ok()
            .or_else(|| self.head());
        self.commit_on(&refname, parent, author, seconds, 0, message, files)
    }

    /// Merge `other` into HEAD with an unchanged tree.
    pub fn merge(&self, author: Author, seconds: i64, message: &str, other: Oid) -> Oid {
        let head = self.head().expect("Merge needs a HEAD commit");
        let head_commit = self.repo.find_commit(head).expect("Failed to find HEAD");
        let other_commit = self.repo.find_commit(other).expect("Failed to find merge parent");
        let tree = head_commit.tree().expect("Failed to get tree");
        let sig = signature(author, seconds, 0);

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&head_commit, &other_commit])
            .expect("Failed to create merge commit")
    }

    /// Commit that changes no files.
    pub fn empty_commit(&self, author: Author, seconds: i64, message: &str) -> Oid {
        self.commit(author, seconds, message, &[])
    }

    pub fn head(&self) -> Option<Oid> {
        self.repo.head().ok().and_then(|h| h.target())
    }

    /// Create a lightweight tag pointing to the given OID.
    pub fn tag_lightweight(&self, name: &str, oid: Oid) {
        let obj = self.repo.find_object(oid, None).expect("Failed to find object");
        self.repo
            .tag_lightweight(name, &obj, false)
            .expect("Failed to create lightweight tag");
    }

    #[allow(clippy::too_many_arguments)]
    fn commit_on(
        &self,
        update_ref: &str,
        parent: Option<Oid>,
        author: Author,
        seconds: i64,
        offset_minutes: i32,
        message: &str,
        files: &[(&str, &str)],
    ) -> Oid {
        let parent = parent.map(|oid| self.repo.find_commit(oid).expect("Failed to find parent"));
        let base_tree = parent.as_ref().map(|c| c.tree().expect("Failed to get parent tree"));

        let mut builder = self
            .repo
            .treebuilder(base_tree.as_ref())
            .expect("Failed to create tree builder");
        for (name, content) in files {
            let blob = self.repo.blob(content.as_bytes()).expect("Failed to write blob");
            builder
                .insert(*name, blob, 0o100644)
                .expect("Failed to insert tree entry");
        }
        let tree_id = builder.write().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let sig = signature(author, seconds, offset_minutes);
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some(update_ref), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }
}

fn signature(author: Author, seconds: i64, offset_minutes: i32) -> Signature<'static> {
    Signature::new(author.name, author.email, &Time::new(seconds, offset_minutes))
        .expect("Failed to create signature")
}

/// Seconds since the epoch for a UTC date and time.
pub fn utc(year: i32, month: u32, day: u32, hour: u32) -> i64 {
    chrono::Utc
        .with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("Invalid test date")
        .timestamp()
}

// =============================================================================
// REPORT PIPELINE HELPERS
// =============================================================================

pub fn test_config(chunk_size: i64) -> GenerationConfig {
    GenerationConfig {
        chunk_size,
        project_id: "acme-reports".to_string(),
        location: "us-central1".to_string(),
        gemini_model: "gemini-test".to_string(),
        credentials_file: None,
        api_endpoint: None,
    }
}

pub fn commit_record(n: usize) -> CommitRecord {
    let date: DateTime<FixedOffset> = DateTime::parse_from_rfc3339("2025-06-02T09:00:00+02:00")
        .expect("Invalid timestamp")
        + chrono::Duration::minutes(n as i64);

    CommitRecord {
        commit_date_time: date,
        author_name: format!("Developer {}", n % 3),
        author_email: format!("dev{}@example.com", n % 3),
        message: format!("Change number {}", n),
        modified_files: vec![format!("src/module_{}.rs", n)],
        extra: Default::default(),
    }
}

pub fn commit_feed(count: usize) -> (Vec<CommitRecord>, String) {
    let records: Vec<CommitRecord> = (0..count).map(commit_record).collect();
    let raw = serde_json::to_string(&records).expect("Failed to serialize commits");
    (records, raw)
}

pub fn issue_record(n: usize) -> IssueRecord {
    IssueRecord {
        id: n.to_string(),
        title: format!("Issue {}", n),
        body: "Something is broken".to_string(),
        created_at: None,
        url: format!("https://github.com/acme/widgets/issues/{}", n),
        state: if n % 2 == 0 { "open" } else { "closed" }.to_string(),
        comments: Vec::new(),
        extra: Default::default(),
    }
}

pub fn text_response(text: &str) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: Some(vec![Candidate {
            content: Some(Content::model(text)),
            finish_reason: Some("STOP".to_string()),
        }]),
        usage_metadata: None,
    }
}

pub fn textless_response() -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: Some(vec![Candidate {
            content: Some(Content {
                role: Some("model".to_string()),
                parts: vec![Part::Other(serde_json::json!({"functionCall": {"name": "noop"}}))],
            }),
            finish_reason: None,
        }]),
        usage_metadata: None,
    }
}

type Reply = Result<Option<GenerateContentResponse>, GeminiError>;

/// A chat backend that answers from a script and records every request.
///
/// Turns without a scripted reply get `"ack <turn>"`.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    requests: Arc<Mutex<Vec<Vec<Content>>>>,
    cancel_on: Option<(usize, CancellationToken)>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
            cancel_on: None,
        }
    }

    /// Queue the replies for the first turns, in order.
    pub fn with_replies(self, replies: Vec<Reply>) -> Self {
        *self.replies.lock().unwrap() = replies.into();
        self
    }

    /// Cancel `token` while answering the given 1-based turn.
    pub fn cancel_during(mut self, turn: usize, token: CancellationToken) -> Self {
        self.cancel_on = Some((turn, token));
        self
    }

    /// Shared view of every request sent, kept after the backend is moved.
    pub fn requests(&self) -> Arc<Mutex<Vec<Vec<Content>>>> {
        self.requests.clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn generate_content(&self, contents: &[Content]) -> Reply {
        let turn = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(contents.to_vec());
            requests.len()
        };

        if let Some((cancel_turn, token)) = &self.cancel_on {
            if *cancel_turn == turn {
                token.cancel();
            }
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Some(text_response(&format!("ack {}", turn)))))
    }
}

/// The user text of the last message in a request.
pub fn last_user_text(request: &[Content]) -> String {
    request
        .last()
        .and_then(|c| c.parts.first())
        .and_then(|p| p.as_text())
        .unwrap_or_default()
        .to_string()
}

/// Outgoing user messages, one per turn.
pub fn sent_messages(requests: &Arc<Mutex<Vec<Vec<Content>>>>) -> Vec<String> {
    requests
        .lock()
        .unwrap()
        .iter()
        .map(|r| last_user_text(r))
        .collect()
}
