//! Groq chat-completions client (OpenAI-compatible wire format).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ChatMessage, ChatResponse, LlmClient, LlmError, TokenUsage, ToolCall, ToolSchema};
use crate::config::{ApiKey, Config};

pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

impl GroqClient {
    pub fn new(
        api_key: ApiKey,
        base_url: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
            temperature,
        })
    }

    pub fn from_config(config: &Config, api_key: ApiKey) -> Result<Self, LlmError> {
        Self::new(
            api_key,
            config.llm_base_url.clone(),
            config.temperature,
            config.request_timeout,
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request_body(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> serde_json::Value {
        let mut body = json!({
            "model": model,
            "messages": messages,
            "temperature": self.temperature,
        });

        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            body["tools"] = json!(tools);
            body["tool_choice"] = json!("auto");
        }

        body
    }
}

fn parse_response(body: CompletionBody) -> Result<ChatResponse, LlmError> {
    let message = body
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or(LlmError::EmptyResponse)?;

    let tool_calls = message.tool_calls.filter(|calls| !calls.is_empty());
    let content = message.content.filter(|c| !c.trim().is_empty());

    if content.is_none() && tool_calls.is_none() {
        return Err(LlmError::EmptyResponse);
    }

    Ok(ChatResponse {
        content,
        tool_calls,
        usage: body.usage,
    })
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResponse, LlmError> {
        let body = self.build_request_body(model, messages, tools);

        debug!(model, messages = messages.len(), "Groq completion request");

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: CompletionBody = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let result = parse_response(parsed)?;
        if let Some(usage) = &result.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Groq completion usage"
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FunctionSchema;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GroqClient {
        GroqClient::new(
            ApiKey::parse("gsk_test").unwrap(),
            format!("{}/openai/v1/", server.uri()),
            0.0,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn sends_bearer_auth_and_parses_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("authorization", "Bearer gsk_test"))
            .and(body_partial_json(json!({ "model": "gemma2-9b-it" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Hello there" } }],
                "usage": { "prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .chat_completion("gemma2-9b-it", &[ChatMessage::user("hi")], None)
            .await
            .expect("completion");

        assert_eq!(response.content.as_deref(), Some("Hello there"));
        assert!(response.tool_calls.is_none());
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[tokio::test]
    async fn parses_tool_calls_and_advertises_tools() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(body_partial_json(json!({ "tool_choice": "auto" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "math", "arguments": "{\"query\":\"2+2\"}" }
                    }]
                } }]
            })))
            .mount(&server)
            .await;

        let tools = vec![ToolSchema {
            tool_type: "function".to_string(),
            function: FunctionSchema {
                name: "math".to_string(),
                description: "Math solver".to_string(),
                parameters: json!({ "type": "object" }),
            },
        }];

        let response = client(&server)
            .chat_completion("m", &[ChatMessage::user("2+2?")], Some(&tools))
            .await
            .expect("completion");

        let calls = response.tool_calls.expect("tool calls");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "math");
        assert!(response.content.is_none());
    }

    #[tokio::test]
    async fn maps_rate_limit_and_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let c = client(&server);
        let first = c.chat_completion("m", &[ChatMessage::user("x")], None).await;
        assert!(matches!(first, Err(LlmError::RateLimited)));

        match c.chat_completion("m", &[ChatMessage::user("x")], None).await {
            Err(LlmError::Api { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid api key"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_choice_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let result = client(&server)
            .chat_completion("m", &[ChatMessage::user("x")], None)
            .await;
        assert!(matches!(result, Err(LlmError::EmptyResponse)));
    }
}
