//! Reasoning tool: a fixed step-by-step prompt sent to the model.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Tool, ToolError, ToolKind};
use crate::llm::{ChatMessage, LlmClient, LlmError};

const REASONING_TEMPLATE: &str = "You are an agent who is required to solve math questions provided to you and share the detailed explanation of how you solved it step by step in bullet points, Also if other questions which are not related to math are provided still you need to answer them with your best response
Question: {question}
Answer:";

/// Answers with a step-by-step explanation from the model.
pub struct ReasoningTool {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl ReasoningTool {
    pub fn new(llm: Arc<dyn LlmClient>, model: String) -> Self {
        Self { llm, model }
    }
}

fn reasoning_prompt(question: &str) -> String {
    REASONING_TEMPLATE.replace("{question}", question)
}

#[async_trait]
impl Tool for ReasoningTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Reason
    }

    fn description(&self) -> &str {
        "A tool for answering logic-based and reasoning questions."
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        let prompt = reasoning_prompt(input.trim());
        let response = self
            .llm
            .chat_completion(&self.model, &[ChatMessage::user(prompt)], None)
            .await?;

        let answer = response
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyResponse)?;
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedLlm;

    #[tokio::test]
    async fn wraps_question_in_reasoning_template() {
        let llm = Arc::new(ScriptedLlm::new().reply(
            "- Speed is distance over time\n- 120 / 2 = 60\n\nThe train travels at 60 km/h.",
        ));
        let tool = ReasoningTool::new(llm.clone(), "m".to_string());

        let out = tool
            .execute("A train covers 120 km in 2 hours. What is its speed?")
            .await
            .unwrap();
        assert!(out.ends_with("The train travels at 60 km/h."));

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        let prompt = requests[0][0].content.as_deref().unwrap();
        assert!(prompt.starts_with("You are an agent who is required to solve math questions"));
        assert!(prompt.contains("Question: A train covers 120 km in 2 hours. What is its speed?\nAnswer:"));
    }

    #[tokio::test]
    async fn model_failures_propagate() {
        let tool = ReasoningTool::new(
            Arc::new(ScriptedLlm::new().fail(LlmError::Network("connection reset".into()))),
            "m".to_string(),
        );
        assert!(matches!(
            tool.execute("why?").await,
            Err(ToolError::Llm(LlmError::Network(_)))
        ));
    }
}
