//! Conversational session over a stateless `generateContent` backend.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::GeminiError;

use super::types::{Content, GenerateContentResponse};

/// A backend that turns a conversation history into one model response.
///
/// `Ok(None)` means the call succeeded but the backend returned no body.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn generate_content(
        &self,
        contents: &[Content],
    ) -> Result<Option<GenerateContentResponse>, GeminiError>;
}

/// One conversation. Every turn re-sends the accumulated history so the
/// backend sees all earlier turns.
///
/// The session owns its backend; dropping the session releases it.
pub struct ChatSession<B> {
    backend: B,
    history: Vec<Content>,
    cancel: CancellationToken,
}

impl<B: ChatBackend> ChatSession<B> {
    pub fn new(backend: B, cancel: CancellationToken) -> Self {
        Self {
            backend,
            history: Vec::new(),
            cancel,
        }
    }

    /// Send one user message and wait for the reply.
    ///
    /// On failure or cancellation the history is left as it was before the call.
    pub async fn send_message(
        &mut self,
        text: &str,
    ) -> Result<Option<GenerateContentResponse>, GeminiError> {
        if self.cancel.is_cancelled() {
            return Err(GeminiError::Cancelled);
        }

        self.history.push(Content::user(text));

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(GeminiError::Cancelled),
            result = self.backend.generate_content(&self.history) => result,
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.history.pop();
                return Err(e);
            }
        };

        if let Some(content) = response.as_ref().and_then(|r| r.first_content()) {
            let mut reply = content.clone();
            reply.role = Some("model".to_string());
            self.history.push(reply);
        } else {
            debug!("Response had no candidate content; history keeps only the user turn");
        }

        Ok(response)
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
