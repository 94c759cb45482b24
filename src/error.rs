//! Error types for repo-pulse modules using thiserror.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::report::{DriverState, Phase};

/// Errors from loading or validating the generation config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config path cannot be empty")]
    EmptyPath,

    #[error("Config file not found at path: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML from {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("chunk_size must be positive in config")]
    NonPositiveChunkSize,

    #[error("{0} cannot be empty in config")]
    EmptyField(&'static str),
}

/// Errors from choosing a model backend credential.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(
        "No authentication method available: neither a credentials file in config or {credentials_var} nor the {api_key_var} env var is set"
    )]
    Unavailable {
        credentials_var: &'static str,
        api_key_var: &'static str,
    },
}

/// Which input feed a parse error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Commits,
    Issues,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::Commits => f.write_str("git logs"),
            Feed::Issues => f.write_str("issues"),
        }
    }
}

/// Errors from parsing raw commit or issue feeds.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to unmarshal {feed} JSON: {source}")]
    Malformed {
        feed: Feed,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the Gemini backend and its OAuth exchange.
#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("Failed to read credentials file {path}: {source}")]
    CredentialsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid credentials file {path}: {reason}")]
    InvalidCredentials { path: PathBuf, reason: String },

    #[error("Failed to sign service account assertion: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("OAuth token exchange failed with status {status}: {body}")]
    TokenExchange { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Gemini API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode Gemini response: {0}")]
    Decode(String),

    #[error("Request cancelled")]
    Cancelled,
}

/// Errors from the report generation pipeline.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Authentication(#[from] AuthError),

    #[error("Failed to initialize Gemini AI client: {0}")]
    ClientInitialization(#[source] GeminiError),

    #[error(transparent)]
    MalformedInput(#[from] InputError),

    #[error("Failed to send {phase} to Gemini: {source}")]
    Transmission {
        phase: Phase,
        #[source]
        source: GeminiError,
    },

    #[error("Failed to marshal {phase} to JSON: {source}")]
    Serialization {
        phase: Phase,
        #[source]
        source: serde_json::Error,
    },

    #[error("Report generation cancelled during {phase}")]
    Cancelled { phase: Phase },

    #[error("Invalid session transition from {from:?} to {to:?}")]
    InvalidTransition { from: DriverState, to: DriverState },

    #[error("Failed to write report file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    RevwalkError(#[source] git2::Error),

    #[error("Failed to parse commit: {0}")]
    ParseCommit(#[source] git2::Error),

    #[error("Failed to diff commit {hash}: {source}")]
    DiffFailed {
        hash: String,
        #[source]
        source: git2::Error,
    },

    #[error("Commit {hash} has invalid timestamp (seconds={seconds}, offset={offset_minutes}m)")]
    InvalidTimestamp {
        hash: String,
        seconds: i64,
        offset_minutes: i32,
    },

    #[error("Failed to marshal log entries to JSON: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Errors from GitHub API operations.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error(
        "GitHub authentication failed: no valid auth found. Set GITHUB_TOKEN or run 'gh auth login'"
    )]
    AuthenticationFailed,

    #[error("Failed to build GitHub client: {0}")]
    ClientBuild(#[source] Box<octocrab::Error>),

    #[error("GitHub request for {what} failed: {source}")]
    Request {
        what: String,
        #[source]
        source: Box<octocrab::Error>,
    },

    #[error("Rate limited by GitHub API while fetching {what}")]
    RateLimited { what: String },

    #[error("Repository not found: {owner}/{repo}")]
    RepositoryNotFound { owner: String, repo: String },

    #[error("Failed to parse repository URL: {0}")]
    InvalidRepositoryUrl(String),

    #[error("Repository has no 'origin' remote with a URL")]
    NoOriginRemote,
}
