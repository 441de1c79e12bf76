//! One chat turn: record the prompt, run a freshly configured agent, record the reply.

use std::sync::Arc;

use serde::Serialize;

use crate::agent::{Agent, AgentConfig, AgentError, AgentObserver};
use crate::config::Config;
use crate::llm::{GroqClient, LlmClient};
use crate::session::{Message, Session};
use crate::tools::ToolRegistry;

/// Assistant message recorded when the agent fails.
pub const FALLBACK_MESSAGE: &str = "⚠️ An error occurred while searching. Please try again later.";

/// Builds the LLM client for one turn from that turn's agent settings.
pub type LlmFactory = Arc<dyn Fn(&AgentConfig) -> Arc<dyn LlmClient> + Send + Sync>;

/// Diagnostics for a failed turn. Never stored in the conversation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TurnError {
    pub kind: String,
    pub detail: String,
}

impl From<&AgentError> for TurnError {
    fn from(e: &AgentError) -> Self {
        Self {
            kind: e.kind().to_string(),
            detail: e.to_string(),
        }
    }
}

/// Result of one turn as shown to the user.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    /// The assistant message that was appended.
    pub message: Message,
    pub error: Option<TurnError>,
}

/// Per-turn overrides supplied with the prompt.
#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    /// Credential entered by the user; falls back to the configured key.
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// Runs chat turns against the shared tool set.
#[derive(Clone)]
pub struct ChatService {
    config: Config,
    tools: Arc<ToolRegistry>,
    llm_factory: LlmFactory,
}

impl ChatService {
    /// Service backed by the hosted OpenAI-compatible endpoint in `config`.
    pub fn new(config: Config, tools: Arc<ToolRegistry>) -> Self {
        let http = reqwest::Client::new();
        let base_url = config.llm_base_url.clone();
        let llm_factory: LlmFactory = Arc::new(move |agent_config: &AgentConfig| {
            Arc::new(GroqClient::new(
                http.clone(),
                agent_config.credential.clone(),
                &base_url,
            )) as Arc<dyn LlmClient>
        });
        Self::with_llm_factory(config, tools, llm_factory)
    }

    pub fn with_llm_factory(config: Config, tools: Arc<ToolRegistry>, llm_factory: LlmFactory) -> Self {
        Self {
            config,
            tools,
            llm_factory,
        }
    }

    /// Agent settings for one turn. Not cached: a credential change applies
    /// to the very next turn.
    pub fn agent_config(&self, options: &TurnOptions) -> AgentConfig {
        AgentConfig {
            model: options
                .model
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| self.config.default_model.clone()),
            credential: options
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .or_else(|| self.config.api_key.clone())
                .unwrap_or_default(),
            streaming: self.config.streaming,
            handle_parsing_errors: true,
            max_iterations: self.config.max_iterations,
        }
    }

    /// Append `prompt`, run the agent over the whole conversation and append
    /// its answer, or the fallback message if it failed.
    ///
    /// Exactly two messages are appended per call. Callers are expected to
    /// hold the session's turn lock.
    pub async fn run_turn(
        &self,
        session: &Session,
        prompt: &str,
        options: &TurnOptions,
        observer: &dyn AgentObserver,
    ) -> TurnReply {
        session.append(Message::user(prompt)).await;

        let agent_config = self.agent_config(options);
        let llm = (self.llm_factory)(&agent_config);
        let agent = Agent::new(agent_config, llm, self.tools.clone());

        let conversation = session.messages().await;
        tracing::info!(
            session_id = %session.id,
            model = %agent.config().model,
            messages = conversation.len(),
            "Running agent turn"
        );

        let (message, error) = match agent.run(&conversation, observer).await {
            Ok(answer) => (Message::assistant(answer), None),
            Err(e) => {
                tracing::error!(session_id = %session.id, kind = e.kind(), "Agent run failed: {}", e);
                (Message::assistant(FALLBACK_MESSAGE), Some(TurnError::from(&e)))
            }
        };

        session.append(message.clone()).await;
        TurnReply { message, error }
    }
}
