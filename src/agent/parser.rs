//! Parser for ReAct-formatted model output.

use std::sync::OnceLock;

use regex::Regex;

const FINAL_ANSWER_ACTION: &str = "Final Answer:";

/// What the model asked for on this step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOutput {
    /// Call `tool` with `input`.
    Action { tool: String, input: String },
    /// Stop and answer.
    Finish { answer: String },
}

/// Output that follows neither the action nor the final-answer format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Why parsing failed, including the raw output.
    pub message: String,
    /// Text fed back to the model as the observation when errors are handled.
    pub observation: String,
}

fn action_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
            .expect("valid action regex")
    })
}

fn action_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)Action\s*\d*\s*:").expect("valid action regex"))
}

pub fn parse(text: &str) -> Result<ParsedOutput, ParseError> {
    let includes_answer = text.contains(FINAL_ANSWER_ACTION);

    if let Some(captures) = action_re().captures(text) {
        if includes_answer {
            return Err(ParseError {
                message: format!(
                    "Parsing LLM output produced both a final answer and a parse-able action: {}",
                    text
                ),
                observation: "Invalid or incomplete response".to_string(),
            });
        }
        let tool = captures[1].trim().to_string();
        let raw_input = &captures[2];
        let raw_input = raw_input
            .split_once("\nObservation")
            .map(|(before, _)| before)
            .unwrap_or(raw_input);
        let input = raw_input.trim().trim_matches('"').to_string();
        return Ok(ParsedOutput::Action { tool, input });
    }

    if includes_answer {
        let answer = text
            .rsplit(FINAL_ANSWER_ACTION)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        return Ok(ParsedOutput::Finish { answer });
    }

    let observation = if !action_only_re().is_match(text) {
        "Invalid Format: Missing 'Action:' after 'Thought:'"
    } else {
        "Invalid Format: Missing 'Action Input:' after 'Action:'"
    };
    Err(ParseError {
        message: format!("Could not parse LLM output: `{}`", text),
        observation: observation.to_string(),
    })
}

/// The free-text reasoning before the first `Action:` or `Final Answer:`.
pub fn thought(text: &str) -> &str {
    let end = [text.find("Action"), text.find(FINAL_ANSWER_ACTION)]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(text.len());
    text[..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_and_strips_quotes() {
        let out = parse(" I should look this up.\nAction: wikipedia\nAction Input: \"machine learning\"\n");
        assert_eq!(
            out,
            Ok(ParsedOutput::Action {
                tool: "wikipedia".to_string(),
                input: "machine learning".to_string()
            })
        );
    }

    #[test]
    fn action_input_stops_at_hallucinated_observation() {
        let out = parse("Action: Search\nAction Input: rust 2024\nObservation: made up").unwrap();
        assert_eq!(
            out,
            ParsedOutput::Action {
                tool: "Search".to_string(),
                input: "rust 2024".to_string()
            }
        );
    }

    #[test]
    fn parses_final_answer() {
        let out = parse(" I now know the final answer\nFinal Answer: ML is a field of AI.\n");
        assert_eq!(
            out,
            Ok(ParsedOutput::Finish {
                answer: "ML is a field of AI.".to_string()
            })
        );
    }

    #[test]
    fn rejects_action_together_with_final_answer() {
        let err = parse("Action: arxiv\nAction Input: x\nFinal Answer: y").unwrap_err();
        assert_eq!(err.observation, "Invalid or incomplete response");
    }

    #[test]
    fn explains_missing_parts() {
        let err = parse("I am not sure what to do").unwrap_err();
        assert_eq!(err.observation, "Invalid Format: Missing 'Action:' after 'Thought:'");
        assert!(err.message.contains("I am not sure"));

        let err = parse("Action: Search").unwrap_err();
        assert_eq!(err.observation, "Invalid Format: Missing 'Action Input:' after 'Action:'");
    }

    #[test]
    fn thought_is_text_before_action() {
        assert_eq!(thought(" Let me search.\nAction: Search\nAction Input: q"), "Let me search.");
        assert_eq!(thought(" Done.\nFinal Answer: 42"), "Done.");
        assert_eq!(thought("just words"), "just words");
    }
}
