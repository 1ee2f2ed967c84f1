//! LLM client abstraction.
//!
//! The agent and the LLM-backed tools talk to the model through [`LlmClient`],
//! an OpenAI-style chat-completions interface. [`GroqClient`] is the only
//! production implementation.

mod groq;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use groq::GroqClient;

/// Chat-completion client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one completion. `tools` enables native function calling.
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResponse, LlmError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A message in a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object, as sent by the provider.
    pub arguments: String,
}

/// Function definition advertised to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionSchema,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },
    #[error("LLM rate limited")]
    RateLimited,
    #[error("LLM network error: {0}")]
    Network(String),
    #[error("LLM response could not be parsed: {0}")]
    Parse(String),
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted client for unit tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    pub struct ScriptedLlm {
        responses: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedLlm {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, content: &str) -> Self {
            self.push(Ok(ChatResponse {
                content: Some(content.to_string()),
                ..Default::default()
            }))
        }

        pub fn tool_call(self, name: &str, arguments: serde_json::Value) -> Self {
            self.push(Ok(ChatResponse {
                content: None,
                tool_calls: Some(vec![ToolCall {
                    id: format!("call_{}", name),
                    call_type: function_type(),
                    function: FunctionCall {
                        name: name.to_string(),
                        arguments: arguments.to_string(),
                    },
                }]),
                usage: None,
            }))
        }

        pub fn fail(self, error: LlmError) -> Self {
            self.push(Err(error))
        }

        fn push(self, response: Result<ChatResponse, LlmError>) -> Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn chat_completion(
            &self,
            _model: &str,
            messages: &[ChatMessage],
            _tools: Option<&[ToolSchema]>,
        ) -> Result<ChatResponse, LlmError> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyResponse))
        }
    }
}
