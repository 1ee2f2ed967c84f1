//! Math tool: evaluates arithmetic locally, asking the model to translate
//! word problems into an expression first.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;

use super::{evaluate, format_number, EvalError, Tool, ToolError, ToolKind};
use crate::llm::{ChatMessage, LlmClient};

const TRANSLATE_PROMPT: &str = r#"Translate a math problem into a single-line arithmetic expression that can be evaluated by a calculator.
Supported: numbers, + - * / % ^ **, parentheses, the constants pi, e and tau, and the functions sqrt, abs, exp, ln, log, log10, log2, sin, cos, tan, asin, acos, atan, floor, ceil, round, min, max and pow.
Use the following format:

Question: ${Question with math problem.}
```text
${single line mathematical expression that solves the problem}
```
...evaluation...
```output
${Output of the evaluation}
```
Answer: ${Answer}

Begin.

Question: What is 37593 * 67?
```text
37593 * 67
```
...evaluation...
```output
2518731
```
Answer: 2518731

Question: 37593^(1/5)
```text
37593 ^ (1 / 5)
```
...evaluation...
```output
8.222831614237718
```
Answer: 8.222831614237718

Question: {question}
"#;

static EXPRESSION_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```text\s*(.*?)\s*```").unwrap());

pub struct MathTool {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl MathTool {
    pub fn new(llm: Arc<dyn LlmClient>, model: String) -> Self {
        Self { llm, model }
    }

    async fn translate(&self, question: &str) -> Result<String, ToolError> {
        let prompt = TRANSLATE_PROMPT.replace("{question}", question);
        let response = self
            .llm
            .chat_completion(&self.model, &[ChatMessage::user(prompt)], None)
            .await?;
        Ok(response.content.unwrap_or_default())
    }
}

/// Turn the model's reply into a tool result.
fn interpret_reply(reply: &str) -> Result<String, ToolError> {
    let reply = reply.trim();

    if let Some(caps) = EXPRESSION_BLOCK.captures(reply) {
        let expression = caps[1].trim();
        let value = evaluate(expression)?;
        tracing::debug!(expression, value, "Evaluated translated expression");
        return Ok(format!("Answer: {}", format_number(value)));
    }

    if reply.starts_with("Answer:") {
        return Ok(reply.to_string());
    }
    if let Some(idx) = reply.rfind("Answer:") {
        return Ok(reply[idx..].trim().to_string());
    }

    Err(ToolError::MalformedResponse(format!(
        "unknown format from math model: {}",
        reply
    )))
}

#[async_trait]
impl Tool for MathTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Math
    }

    fn description(&self) -> &str {
        "A tool for answering math related questions. Only input mathematical expression need to be provided"
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        let question = input.trim();

        match evaluate(question) {
            Ok(value) => return Ok(format!("Answer: {}", format_number(value))),
            Err(EvalError::TooDeep) => return Err(EvalError::TooDeep.into()),
            Err(_) => {}
        }

        let reply = self.translate(question).await?;
        interpret_reply(&reply)
    }
}
