use thiserror::Error;

use crate::llm::LlmError;

/// Why an agent run ended without an answer.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    #[error("{0}")]
    Parse(String),

    #[error("LLM returned empty response")]
    EmptyResponse,

    #[error("Conversation has no user message to answer")]
    NoQuestion,
}

impl AgentError {
    /// Stable short name of the failure category.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Llm(_) => "llm",
            AgentError::Tool { .. } => "tool",
            AgentError::Parse(_) => "parse",
            AgentError::EmptyResponse => "empty_response",
            AgentError::NoQuestion => "no_question",
        }
    }
}
