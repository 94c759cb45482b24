//! Gemini model backend: credential selection, OAuth, and chat sessions.

pub mod auth;
pub mod chat;
pub mod client;
pub mod credentials;
pub mod types;

pub use auth::{API_KEY_ENV_VAR, AuthMethod, CREDENTIALS_FILE_ENV_VAR, CredentialSource, select_auth};
pub use chat::{ChatBackend, ChatSession};
pub use client::{GeminiClient, RequestAuth};
pub use types::{Candidate, Content, GenerateContentResponse, Part};
