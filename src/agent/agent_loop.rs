//! Core agent loop implementation.

use std::sync::Arc;

use crate::llm::{ChatMessage, CompletionRequest, LlmClient};
use crate::session::{Message, Role};
use crate::tools::ToolRegistry;

use super::error::AgentError;
use super::events::{AgentEvent, AgentObserver};
use super::parser::{self, ParsedOutput};
use super::prompt::{build_prompt, OBSERVATION_PREFIX, STOP_SEQUENCES, THOUGHT_PREFIX};

/// Answer returned when the iteration budget runs out.
pub const STOPPED_MESSAGE: &str = "Agent stopped due to iteration limit or time limit.";

/// Per-turn agent settings. Built fresh for every turn.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub credential: String,
    pub streaming: bool,
    /// Feed malformed model output back as an observation instead of failing.
    pub handle_parsing_errors: bool,
    pub max_iterations: usize,
}

/// Zero-shot ReAct agent over a fixed tool set.
pub struct Agent {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
}

impl Agent {
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>) -> Self {
        Self { config, llm, tools }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Answer the latest user message of `conversation`.
    ///
    /// Earlier messages are passed to the model as context. Every step is
    /// reported to `observer` as it happens.
    pub async fn run(
        &self,
        conversation: &[Message],
        observer: &dyn AgentObserver,
    ) -> Result<String, AgentError> {
        let (history, question) = split_turn(conversation)?;
        let mut scratchpad = String::new();
        let on_token = |text: &str| {
            observer.on_event(AgentEvent::Token {
                text: text.to_string(),
            })
        };

        for iteration in 0..self.config.max_iterations {
            tracing::debug!("Agent iteration {}", iteration + 1);

            let request = CompletionRequest {
                model: self.config.model.clone(),
                messages: vec![ChatMessage::user(build_prompt(
                    &self.tools,
                    history,
                    question,
                    &scratchpad,
                ))],
                stop: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
                temperature: 0.0,
                stream: self.config.streaming,
            };

            let output = self.llm.complete(&request, &on_token).await?;
            // Blank output is a format error like any other when those are handled.
            if output.trim().is_empty() && !self.config.handle_parsing_errors {
                return Err(AgentError::EmptyResponse);
            }

            let thought = parser::thought(&output);
            if !thought.is_empty() {
                observer.on_event(AgentEvent::Thought {
                    content: thought.to_string(),
                });
            }

            let observation = match parser::parse(&output) {
                Ok(ParsedOutput::Finish { answer }) => {
                    tracing::info!(iterations = iteration + 1, "Agent finished");
                    observer.on_event(AgentEvent::Finish {
                        answer: answer.clone(),
                    });
                    return Ok(answer);
                }
                Ok(ParsedOutput::Action { tool, input }) => {
                    self.execute_tool(&tool, &input, observer).await?
                }
                Err(e) if self.config.handle_parsing_errors => {
                    tracing::warn!("{}", e.message);
                    observer.on_event(AgentEvent::ParseError {
                        observation: e.observation.clone(),
                    });
                    e.observation
                }
                Err(e) => return Err(AgentError::Parse(e.message)),
            };

            scratchpad.push_str(&output);
            scratchpad.push('\n');
            scratchpad.push_str(OBSERVATION_PREFIX);
            scratchpad.push_str(&observation);
            scratchpad.push('\n');
            scratchpad.push_str(THOUGHT_PREFIX);
        }

        tracing::warn!(
            max_iterations = self.config.max_iterations,
            "Agent stopped without a final answer"
        );
        observer.on_event(AgentEvent::Finish {
            answer: STOPPED_MESSAGE.to_string(),
        });
        Ok(STOPPED_MESSAGE.to_string())
    }

    /// Run one tool and return its observation.
    async fn execute_tool(
        &self,
        tool_name: &str,
        input: &str,
        observer: &dyn AgentObserver,
    ) -> Result<String, AgentError> {
        observer.on_event(AgentEvent::ToolStart {
            tool: tool_name.to_string(),
            input: input.to_string(),
        });

        let output = match self.tools.get(tool_name) {
            Some(tool) => {
                tracing::info!(tool = tool_name, input, "Calling tool");
                tool.invoke(input).await.map_err(|e| AgentError::Tool {
                    tool: tool_name.to_string(),
                    message: e.to_string(),
                })?
            }
            None => format!(
                "{} is not a valid tool, try one of [{}].",
                tool_name,
                self.tools.names().join(", ")
            ),
        };

        observer.on_event(AgentEvent::ToolEnd {
            tool: tool_name.to_string(),
            output: output.clone(),
        });
        Ok(output)
    }
}

/// Split a conversation into the context before the latest user message and
/// that message's text.
fn split_turn(conversation: &[Message]) -> Result<(&[Message], &str), AgentError> {
    let idx = conversation
        .iter()
        .rposition(|m| m.role == Role::User)
        .ok_or(AgentError::NoQuestion)?;
    Ok((&conversation[..idx], conversation[idx].content.as_str()))
}
