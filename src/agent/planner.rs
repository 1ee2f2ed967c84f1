//! Planners decide the next move of the agent: call a tool, or answer.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use super::prompt::{build_react_prompt, build_system_prompt, FINAL_ANSWER_PREFIX};
use super::{AgentError, AgentStep};
use crate::chat::{ChatRole, Message};
use crate::llm::{ChatMessage, FunctionCall, LlmClient, Role, ToolCall, ToolSchema};
use crate::tools::{input_from_arguments, ToolInfo, ToolKind, ToolRegistry};

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)").unwrap()
});

/// What the agent does next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Search(String),
    Lookup(String),
    Math(String),
    Reason(String),
    /// The model named a tool that does not exist. The executor answers
    /// with an observation listing the real tools.
    InvalidTool { requested: String, input: String },
    DirectAnswer(String),
}

impl Decision {
    pub fn tool(kind: ToolKind, input: impl Into<String>) -> Self {
        let input = input.into();
        match kind {
            ToolKind::Search => Decision::Search(input),
            ToolKind::Lookup => Decision::Lookup(input),
            ToolKind::Math => Decision::Math(input),
            ToolKind::Reason => Decision::Reason(input),
        }
    }

    /// Resolve a tool name written by the model.
    pub fn action(name: &str, input: impl Into<String>) -> Self {
        match ToolKind::from_name(name) {
            Some(kind) => Self::tool(kind, input),
            None => Decision::InvalidTool {
                requested: name.trim().to_string(),
                input: input.into(),
            },
        }
    }
}

/// A decision together with the raw model output that produced it.
#[derive(Debug, Clone)]
pub struct Plan {
    pub decision: Decision,
    pub log: String,
    /// Provider tool-call id, for planners using native function calling
    pub call_id: Option<String>,
}

#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, transcript: &[Message], steps: &[AgentStep]) -> Result<Plan, AgentError>;
}

/// Zero-shot ReAct planner driven by a text protocol.
pub struct ReactPlanner {
    llm: Arc<dyn LlmClient>,
    model: String,
    tools: Vec<ToolInfo>,
}

impl ReactPlanner {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>, tools: &ToolRegistry) -> Self {
        Self {
            llm,
            model: model.into(),
            tools: tools.list_tools(),
        }
    }
}

#[async_trait]
impl Planner for ReactPlanner {
    async fn plan(&self, transcript: &[Message], steps: &[AgentStep]) -> Result<Plan, AgentError> {
        let prompt = build_react_prompt(&self.tools, transcript, steps);
        let response = self
            .llm
            .chat_completion(&self.model, &[ChatMessage::user(prompt)], None)
            .await?;
        let text = response.content.unwrap_or_default();

        let log = strip_observation(&text).to_string();
        let decision = parse_react(&log)?;
        Ok(Plan {
            decision,
            log,
            call_id: None,
        })
    }
}

/// Drop anything the model hallucinated after its own action.
fn strip_observation(text: &str) -> &str {
    let end = text.find("\nObservation:").unwrap_or(text.len());
    text[..end].trim_end()
}

/// Parse one ReAct completion.
pub fn parse_react(text: &str) -> Result<Decision, AgentError> {
    let includes_answer = text.contains(FINAL_ANSWER_PREFIX);

    if let Some(caps) = ACTION_RE.captures(text) {
        if includes_answer {
            return Err(AgentError::MalformedPlan(format!(
                "output contains both a final answer and an action: `{}`",
                text
            )));
        }
        let action = caps[1].trim();
        let input = caps[2].trim().trim_matches(' ').trim_matches('"');
        return Ok(Decision::action(action, input));
    }

    if includes_answer {
        let answer = text
            .rsplit(FINAL_ANSWER_PREFIX)
            .next()
            .unwrap_or_default()
            .trim();
        return Ok(Decision::DirectAnswer(answer.to_string()));
    }

    Err(AgentError::MalformedPlan(format!(
        "could not parse output: `{}`",
        text
    )))
}

/// Planner using the provider's native function calling.
pub struct ToolCallPlanner {
    llm: Arc<dyn LlmClient>,
    model: String,
    system_prompt: String,
    schemas: Vec<ToolSchema>,
}

impl ToolCallPlanner {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>, tools: &ToolRegistry) -> Self {
        Self {
            llm,
            model: model.into(),
            system_prompt: build_system_prompt(&tools.list_tools()),
            schemas: tools.get_tool_schemas(),
        }
    }

    fn build_messages(&self, transcript: &[Message], steps: &[AgentStep]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(transcript.len() + steps.len() * 2 + 1);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(transcript.iter().map(|m| match m.role() {
            ChatRole::User => ChatMessage::user(m.content()),
            ChatRole::Assistant => ChatMessage::assistant(m.content()),
        }));

        for (i, step) in steps.iter().enumerate() {
            let id = step
                .call_id
                .clone()
                .unwrap_or_else(|| format!("call_{}", i));
            messages.push(ChatMessage {
                role: Role::Assistant,
                content: None,
                tool_calls: Some(vec![ToolCall {
                    id: id.clone(),
                    call_type: "function".to_string(),
                    function: FunctionCall {
                        name: step.tool.clone(),
                        arguments: json!({ "query": step.input }).to_string(),
                    },
                }]),
                tool_call_id: None,
            });
            messages.push(ChatMessage {
                role: Role::Tool,
                content: Some(step.observation.clone()),
                tool_calls: None,
                tool_call_id: Some(id),
            });
        }
        messages
    }
}

#[async_trait]
impl Planner for ToolCallPlanner {
    async fn plan(&self, transcript: &[Message], steps: &[AgentStep]) -> Result<Plan, AgentError> {
        let messages = self.build_messages(transcript, steps);
        let response = self
            .llm
            .chat_completion(&self.model, &messages, Some(&self.schemas))
            .await?;

        // Tools run one at a time; extra parallel calls are re-planned next round.
        if let Some(call) = response.tool_calls.and_then(|calls| calls.into_iter().next()) {
            let input = input_from_arguments(&call.function.arguments);
            return Ok(Plan {
                decision: Decision::action(&call.function.name, input),
                log: format!("{}({})", call.function.name, call.function.arguments),
                call_id: Some(call.id),
            });
        }

        match response.content {
            Some(content) => Ok(Plan {
                decision: Decision::DirectAnswer(content.trim().to_string()),
                log: content,
                call_id: None,
            }),
            None => Err(AgentError::MalformedPlan(
                "response has neither content nor tool calls".to_string(),
            )),
        }
    }
}
