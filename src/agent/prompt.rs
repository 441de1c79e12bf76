//! Zero-shot ReAct prompt templates for the agent.

use crate::session::{Message, Role};
use crate::tools::ToolRegistry;

/// Prefix the model uses before an observation.
pub const OBSERVATION_PREFIX: &str = "Observation: ";
/// Generation stops before the model invents its own observation.
pub const STOP_SEQUENCES: [&str; 2] = ["\nObservation:", "\n\tObservation:"];
/// Prefix that opens every model turn in the scratchpad.
pub const THOUGHT_PREFIX: &str = "Thought:";

/// Render the full ReAct prompt for one model call.
///
/// `history` holds the conversation before the current question; it is shown
/// as context only, the question is what the agent must answer.
pub fn build_prompt(
    tools: &ToolRegistry,
    history: &[Message],
    question: &str,
    scratchpad: &str,
) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("{}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");
    let tool_names = tools.names().join(", ");

    format!(
        r#"Answer the following questions as best you can. You have access to the following tools:

{tool_descriptions}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

Begin!

{history}Question: {question}
{THOUGHT_PREFIX}{scratchpad}"#,
        history = render_history(history),
    )
}

/// Earlier turns as a labelled transcript, or nothing for a fresh conversation.
fn render_history(history: &[Message]) -> String {
    if history.is_empty() {
        return String::new();
    }

    let transcript = history
        .iter()
        .map(|m| {
            let speaker = match m.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{}: {}", speaker, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("Conversation so far:\n{}\n\n", transcript)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;

    fn tools() -> ToolRegistry {
        ToolRegistry::with_search_tools(&ToolsConfig::default()).unwrap()
    }

    #[test]
    fn prompt_lists_tools_and_question() {
        let prompt = build_prompt(&tools(), &[], "What is machine learning?", "");

        assert!(prompt.contains("should be one of [Search, arxiv, wikipedia]"));
        assert!(prompt.contains("\nwikipedia: A wrapper around Wikipedia."));
        assert!(prompt.ends_with("Question: What is machine learning?\nThought:"));
        assert!(!prompt.contains("Conversation so far"));
    }

    #[test]
    fn earlier_turns_are_context_not_the_question() {
        let history = vec![
            Message::assistant("Hi there"),
            Message::user("Who wrote Dune?"),
            Message::assistant("Frank Herbert."),
        ];
        let prompt = build_prompt(&tools(), &history, "When was he born?", " I should search");

        assert!(prompt.contains(
            "Conversation so far:\nAssistant: Hi there\nUser: Who wrote Dune?\nAssistant: Frank Herbert.\n\nQuestion: When was he born?"
        ));
        assert!(prompt.ends_with("Thought: I should search"));
    }
}
