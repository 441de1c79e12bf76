//! API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentEvent;
use crate::chat::TurnError;
use crate::session::Message;

/// Request to submit a user message to a session.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    /// The user prompt
    pub content: String,

    /// Groq API key for this turn (uses the configured key if not specified)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Optional model override (uses default if not specified)
    #[serde(default)]
    pub model: Option<String>,
}

/// Response after a completed turn.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageResponse {
    /// The assistant message appended to the conversation
    pub message: Message,

    /// Why the agent failed, if it did
    pub error: Option<TurnError>,

    /// Intermediate agent steps, in order
    pub events: Vec<AgentEvent>,
}

/// Full session state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub created_at: String,
    pub messages: Vec<Message>,
}

/// Session entry in listings.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub created_at: String,
    pub message_count: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
