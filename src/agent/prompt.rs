//! Prompt templates for the agent.

use crate::chat::{ChatRole, Message};
use crate::tools::ToolInfo;

use super::AgentStep;

/// Prefix the ReAct protocol uses for the concluding line.
pub const FINAL_ANSWER_PREFIX: &str = "Final Answer:";

/// Build the zero-shot ReAct prompt.
///
/// The last user message is the question; earlier messages are rendered as
/// conversation context. Prior steps form the scratchpad so the model can
/// continue where it left off.
pub fn build_react_prompt(tools: &[ToolInfo], transcript: &[Message], steps: &[AgentStep]) -> String {
    let tool_descriptions = tools
        .iter()
        .map(|t| format!("{}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");
    let tool_names = tools.iter().map(|t| t.name).collect::<Vec<_>>().join(", ");

    let (question, history) = split_question(transcript);
    let conversation = if history.is_empty() {
        String::new()
    } else {
        format!("Conversation so far:\n{}\n\n", render_history(history))
    };

    let mut scratchpad = String::new();
    for step in steps {
        scratchpad.push_str(&step.log);
        scratchpad.push_str("\nObservation: ");
        scratchpad.push_str(&step.observation);
        scratchpad.push_str("\nThought: ");
    }

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
{FINAL_ANSWER_PREFIX} the final answer to the original input question

Begin!

{conversation}Question: {question}
Thought:{scratchpad}"#
    )
}

/// System prompt for native function calling.
pub fn build_system_prompt(tools: &[ToolInfo]) -> String {
    let tool_descriptions = tools
        .iter()
        .map(|t| format!("- **{}**: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a helpful assistant who can solve math problems and answer general questions.

## Tools

{tool_descriptions}

## Guidelines

1. Use the math tool for arithmetic instead of computing large numbers in your head.
2. Use the search or wikipedia tools for facts you are not sure about.
3. For word problems, explain the solution step by step in bullet points.
4. When you have enough information, answer the user directly without calling a tool."#
    )
}

/// Split a transcript into the current question and the messages before it.
fn split_question(transcript: &[Message]) -> (&str, &[Message]) {
    match transcript
        .iter()
        .rposition(|m| m.role() == ChatRole::User)
    {
        Some(idx) => (transcript[idx].content(), &transcript[..idx]),
        None => ("", transcript),
    }
}

fn render_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|m| match m.role() {
            ChatRole::User => format!("Human: {}", m.content()),
            ChatRole::Assistant => format!("AI: {}", m.content()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
