//! Intermediate agent events and the observers that receive them.

use std::sync::Mutex;

use serde::Serialize;

/// Something the agent did while working on a turn.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Streamed model text.
    Token { text: String },
    /// Reasoning the model wrote before choosing an action.
    Thought { content: String },
    /// A tool is about to run.
    ToolStart { tool: String, input: String },
    /// A tool returned.
    ToolEnd { tool: String, output: String },
    /// Model output did not follow the format; `observation` went back to the model.
    ParseError { observation: String },
    /// The agent produced its answer.
    Finish { answer: String },
}

impl AgentEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            AgentEvent::Token { .. } => "token",
            AgentEvent::Thought { .. } => "thought",
            AgentEvent::ToolStart { .. } => "tool_start",
            AgentEvent::ToolEnd { .. } => "tool_end",
            AgentEvent::ParseError { .. } => "parse_error",
            AgentEvent::Finish { .. } => "finish",
        }
    }
}

/// Side-channel consumer of agent events.
///
/// Called synchronously from inside the agent loop; implementations must not
/// block.
pub trait AgentObserver: Send + Sync {
    fn on_event(&self, event: AgentEvent);
}

impl<F> AgentObserver for F
where
    F: Fn(AgentEvent) + Send + Sync,
{
    fn on_event(&self, event: AgentEvent) {
        self(event)
    }
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl AgentObserver for NoopObserver {
    fn on_event(&self, _event: AgentEvent) {}
}

/// Observer that keeps every step except streamed tokens.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<AgentEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_events(self) -> Vec<AgentEvent> {
        self.events
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AgentObserver for EventLog {
    fn on_event(&self, event: AgentEvent) {
        if matches!(event, AgentEvent::Token { .. }) {
            return;
        }
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
