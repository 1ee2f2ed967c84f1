//! Tool adapters the agent can call.
//!
//! Every tool maps a text query to a text result. Tools hold no session
//! state and never see the transcript; the agent passes them a single input
//! string and feeds their output back to the planner.

mod expr;
mod math;
mod reasoning;
mod web;
mod wikipedia;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::llm::{FunctionSchema, LlmClient, LlmError, ToolSchema};

pub use expr::{evaluate, format_number, EvalError};
pub use math::MathTool;
pub use reasoning::ReasoningTool;
pub use web::WebSearch;
pub use wikipedia::WikipediaLookup;

/// The closed set of tools the agent may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[serde(rename = "wikipedia")]
    Lookup,
    Math,
    Search,
    #[serde(rename = "reasoning")]
    Reason,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Lookup,
        ToolKind::Math,
        ToolKind::Search,
        ToolKind::Reason,
    ];

    /// Name advertised to the model.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Search => "search",
            ToolKind::Lookup => "wikipedia",
            ToolKind::Math => "math",
            ToolKind::Reason => "reasoning",
        }
    }

    /// Resolve a tool name produced by the model. Matching ignores case,
    /// surrounding quotes and whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name
            .trim()
            .trim_matches(|c| c == '`' || c == '"' || c == '\'')
            .to_lowercase();
        match normalized.as_str() {
            "search" | "web_search" | "duckduckgo" => Some(ToolKind::Search),
            "wikipedia" | "wiki" | "lookup" => Some(ToolKind::Lookup),
            "math" | "math tool" | "calculator" => Some(ToolKind::Math),
            "reasoning" | "reason" => Some(ToolKind::Reason),
            _ => None,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("upstream returned HTTP {0}")]
    UpstreamStatus(u16),
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
    #[error("could not evaluate expression: {0}")]
    Math(#[from] EvalError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("tool '{0}' is not registered")]
    NotRegistered(ToolKind),
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            ToolError::UpstreamStatus(status.as_u16())
        } else if e.is_decode() {
            ToolError::MalformedResponse(e.to_string())
        } else {
            ToolError::Request(e.to_string())
        }
    }
}

/// A callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;

    /// Description shown to the planner.
    fn description(&self) -> &str;

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The input for the tool"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: String,
}

/// The static tool set of an agent.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the four standard tools.
    pub fn standard(config: &Config, llm: Arc<dyn LlmClient>) -> Result<Self, ToolError> {
        let http = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; mathbot/0.1)")
            .timeout(config.request_timeout)
            .build()?;

        let mut registry = Self::new();
        registry.register(Arc::new(WikipediaLookup::new(
            http.clone(),
            config.wikipedia.clone(),
        )));
        registry.register(Arc::new(MathTool::new(llm.clone(), config.model.clone())));
        registry.register(Arc::new(WebSearch::new(http, config.search.clone())));
        registry.register(Arc::new(ReasoningTool::new(llm, config.model.clone())));
        Ok(registry)
    }

    /// Register a tool, replacing any tool of the same kind.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.kind(), tool);
    }

    pub fn get(&self, kind: ToolKind) -> Option<&Arc<dyn Tool>> {
        self.tools.get(&kind)
    }

    pub fn contains(&self, kind: ToolKind) -> bool {
        self.tools.contains_key(&kind)
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .values()
            .map(|t| ToolInfo {
                name: t.kind().name(),
                description: t.description().to_string(),
            })
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().map(|k| k.name()).collect()
    }

    /// Function-calling schemas for every registered tool.
    pub fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .values()
            .map(|t| ToolSchema {
                tool_type: "function".to_string(),
                function: FunctionSchema {
                    name: t.kind().name().to_string(),
                    description: t.description().to_string(),
                    parameters: t.parameters_schema(),
                },
            })
            .collect()
    }

    pub async fn execute(&self, kind: ToolKind, input: &str) -> Result<String, ToolError> {
        let tool = self.get(kind).ok_or(ToolError::NotRegistered(kind))?;
        tracing::info!(tool = %kind, input_len = input.len(), "Executing tool");
        tool.execute(input).await
    }
}

/// Extract the text input from function-call arguments.
///
/// Accepts `{"query": ...}`, any single string field, or a bare JSON string;
/// anything else is passed through as raw JSON text.
pub fn input_from_arguments(arguments: &str) -> String {
    match serde_json::from_str::<Value>(arguments) {
        Ok(Value::String(s)) => s,
        Ok(Value::Object(map)) => {
            if let Some(Value::String(q)) = map.get("query") {
                return q.clone();
            }
            let strings: Vec<&String> = map
                .values()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            match strings.as_slice() {
                [only] => (*only).clone(),
                _ => arguments.to_string(),
            }
        }
        _ => arguments.to_string(),
    }
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Tool doubles for agent and session tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Returns a fixed output (or error) and counts invocations.
    pub struct FakeTool {
        kind: ToolKind,
        output: Result<String, String>,
        pub calls: AtomicUsize,
        pub inputs: Mutex<Vec<String>>,
    }

    impl FakeTool {
        pub fn ok(kind: ToolKind, output: &str) -> Arc<Self> {
            Arc::new(Self {
                kind,
                output: Ok(output.to_string()),
                calls: AtomicUsize::new(0),
                inputs: Mutex::new(Vec::new()),
            })
        }

        pub fn failing(kind: ToolKind, message: &str) -> Arc<Self> {
            Arc::new(Self {
                kind,
                output: Err(message.to_string()),
                calls: AtomicUsize::new(0),
                inputs: Mutex::new(Vec::new()),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Tool for FakeTool {
        fn kind(&self) -> ToolKind {
            self.kind
        }

        fn description(&self) -> &str {
            "fake tool"
        }

        async fn execute(&self, input: &str) -> Result<String, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inputs.lock().unwrap().push(input.to_string());
            self.output.clone().map_err(ToolError::Request)
        }
    }
}
