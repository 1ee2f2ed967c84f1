//! Agent module - plans tool calls and produces one answer per turn.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Ask the planner for a [`Decision`] given the transcript and prior steps
//! 2. If the decision names a tool, execute it and record the observation
//! 3. Repeat until the planner answers directly or max iterations is reached

mod agent_loop;
mod planner;
mod prompt;

use async_trait::async_trait;
use serde::Serialize;

use crate::chat::Message;
use crate::llm::LlmError;
use crate::tools::{ToolError, ToolKind};

pub use agent_loop::{AgentExecutor, ITERATION_LIMIT_ANSWER};
pub use planner::{parse_react, Decision, Plan, Planner, ReactPlanner, ToolCallPlanner};
pub use prompt::{build_react_prompt, build_system_prompt};

/// Something that turns a transcript into an answer.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn respond(&self, transcript: &[Message]) -> Result<AgentOutcome, AgentError>;
}

/// One tool invocation made during a turn.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    /// Tool name as requested; unknown names are kept so the model sees its mistake
    pub tool: String,
    pub input: String,
    pub observation: String,
    /// Planner output that led to this call
    pub log: String,
    #[serde(skip)]
    pub call_id: Option<String>,
}

/// Result of a successful turn.
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    pub answer: String,
    pub steps: Vec<AgentStep>,
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("tool '{tool}' failed: {source}")]
    Tool {
        tool: ToolKind,
        #[source]
        source: ToolError,
    },

    #[error("could not parse LLM output: {0}")]
    MalformedPlan(String),

    #[error("agent setup failed: {0}")]
    Setup(String),
}
