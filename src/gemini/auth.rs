//! Model backend credential selection.
//!
//! Auth order:
//! 1. `credentials_file` from the config
//! 2. GOOGLE_APPLICATION_CREDENTIALS env var
//! 3. VERTEX_AI_API_KEY env var
//!
//! A higher source always wins, even when the file it names is unreadable.
//! Reading the file is left to the client so the error surfaces there.

use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::config::GenerationConfig;
use crate::error::AuthError;

/// Env var naming a Google credentials JSON file.
pub const CREDENTIALS_FILE_ENV_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Env var holding an API key.
pub const API_KEY_ENV_VAR: &str = "VERTEX_AI_API_KEY";

/// Where a credentials file path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Config,
    Environment,
}

/// The connection option handed to the backend client.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    CredentialsFile {
        path: PathBuf,
        source: CredentialSource,
    },
    ApiKey(String),
}

impl AuthMethod {
    /// Human-readable description that never includes the key itself.
    pub fn describe(&self) -> String {
        match self {
            AuthMethod::CredentialsFile {
                path,
                source: CredentialSource::Config,
            } => format!("credentials file from config ({})", path.display()),
            AuthMethod::CredentialsFile {
                path,
                source: CredentialSource::Environment,
            } => format!(
                "credentials file from {} ({})",
                CREDENTIALS_FILE_ENV_VAR,
                path.display()
            ),
            AuthMethod::ApiKey(_) => format!("API key from {}", API_KEY_ENV_VAR),
        }
    }
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::CredentialsFile { path, source } => f
                .debug_struct("CredentialsFile")
                .field("path", path)
                .field("source", source)
                .finish(),
            AuthMethod::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
        }
    }
}

/// Pick a credential using the process environment.
pub fn select_auth(config: &GenerationConfig) -> Result<AuthMethod, AuthError> {
    select_auth_with(config, |name| env::var(name).ok())
}

/// Pick a credential, reading env vars through `lookup`.
pub fn select_auth_with<F>(config: &GenerationConfig, lookup: F) -> Result<AuthMethod, AuthError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = config.credentials_path() {
        return Ok(AuthMethod::CredentialsFile {
            path: path.to_path_buf(),
            source: CredentialSource::Config,
        });
    }

    if let Some(path) = lookup(CREDENTIALS_FILE_ENV_VAR).filter(|v| !v.is_empty()) {
        return Ok(AuthMethod::CredentialsFile {
            path: PathBuf::from(path),
            source: CredentialSource::Environment,
        });
    }

    if let Some(key) = lookup(API_KEY_ENV_VAR).filter(|v| !v.is_empty()) {
        return Ok(AuthMethod::ApiKey(key));
    }

    Err(AuthError::Unavailable {
        credentials_var: CREDENTIALS_FILE_ENV_VAR,
        api_key_var: API_KEY_ENV_VAR,
    })
}
