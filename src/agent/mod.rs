//! Agent module - the zero-shot ReAct reasoning loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Render the prompt with tool descriptions, prior turns and the question
//! 2. Call the LLM, stopping before it invents an observation
//! 3. If the output names an action, run the tool and append the observation
//! 4. Repeat until the output carries a final answer or max iterations reached

mod agent_loop;
mod error;
mod events;
mod parser;
mod prompt;

pub use agent_loop::{Agent, AgentConfig, STOPPED_MESSAGE};
pub use error::AgentError;
pub use events::{AgentEvent, AgentObserver, EventLog, NoopObserver};
pub use prompt::build_prompt;
