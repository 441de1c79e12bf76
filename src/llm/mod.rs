//! Hosted language-model access.
//!
//! The agent only talks to [`LlmClient`]; [`GroqClient`] is the
//! OpenAI-compatible implementation used in production.

mod error;
mod groq;

use async_trait::async_trait;
use serde::Serialize;

pub use error::{LlmError, LlmErrorKind};
pub use groq::GroqClient;

/// Message role on the completion API. The agent sends its whole prompt as
/// one user message.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// One chat completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Generation halts before any of these strings.
    pub stop: Vec<String>,
    pub temperature: f32,
    /// Deliver the completion incrementally through the token callback.
    pub stream: bool,
}

/// Callback receiving streamed text deltas, in order.
pub type TokenSink<'a> = &'a (dyn Fn(&str) + Send + Sync);

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one completion and return its full text.
    ///
    /// When `request.stream` is set, every delta is also passed to `on_token`
    /// as it arrives.
    async fn complete(
        &self,
        request: &CompletionRequest,
        on_token: TokenSink<'_>,
    ) -> Result<String, LlmError>;
}
