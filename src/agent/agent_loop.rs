//! Core agent loop implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chat::Message;
use crate::config::{AgentStrategy, ApiKey, Config};
use crate::llm::{GroqClient, LlmClient};
use crate::tools::{ToolKind, ToolRegistry};

use super::planner::{Decision, Plan, Planner, ReactPlanner, ToolCallPlanner};
use super::{Agent, AgentError, AgentOutcome, AgentStep};

/// Answer returned when the planner never settles on a final answer.
pub const ITERATION_LIMIT_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";

/// Plans with a [`Planner`], runs the chosen tools and returns one answer.
pub struct AgentExecutor {
    planner: Box<dyn Planner>,
    tools: ToolRegistry,
    max_iterations: usize,
}

impl AgentExecutor {
    pub fn new(planner: Box<dyn Planner>, tools: ToolRegistry, max_iterations: usize) -> Self {
        Self {
            planner,
            tools,
            max_iterations,
        }
    }

    /// Build the production agent: Groq client, the four standard tools and
    /// the configured planning strategy.
    pub fn from_config(config: &Config, api_key: ApiKey) -> Result<Self, AgentError> {
        let llm: Arc<dyn LlmClient> = Arc::new(GroqClient::from_config(config, api_key)?);
        let tools = ToolRegistry::standard(config, llm.clone())
            .map_err(|e| AgentError::Setup(e.to_string()))?;

        let planner: Box<dyn Planner> = match config.strategy {
            AgentStrategy::React => Box::new(ReactPlanner::new(llm, config.model.clone(), &tools)),
            AgentStrategy::ToolCalls => {
                Box::new(ToolCallPlanner::new(llm, config.model.clone(), &tools))
            }
        };

        Ok(Self::new(planner, tools, config.max_iterations))
    }

    /// Run one turn against the transcript.
    pub async fn run(&self, transcript: &[Message]) -> Result<AgentOutcome, AgentError> {
        let mut steps: Vec<AgentStep> = Vec::new();

        for iteration in 0..self.max_iterations {
            tracing::debug!(iteration = iteration + 1, "Agent iteration");

            let Plan {
                decision,
                log,
                call_id,
            } = self.planner.plan(transcript, &steps).await?;
            let (tool, input) = match decision {
                Decision::DirectAnswer(answer) => {
                    tracing::info!(steps = steps.len(), "Agent produced final answer");
                    return Ok(AgentOutcome { answer, steps });
                }
                Decision::InvalidTool { requested, input } => {
                    tracing::warn!(tool = %requested, "Planner requested an unknown tool");
                    let observation = format!(
                        "{} is not a valid tool, try one of [{}].",
                        requested,
                        self.tools.names().join(", ")
                    );
                    steps.push(AgentStep {
                        tool: requested,
                        input,
                        observation,
                        log,
                        call_id,
                    });
                    continue;
                }
                Decision::Search(q) => (ToolKind::Search, q),
                Decision::Lookup(q) => (ToolKind::Lookup, q),
                Decision::Math(q) => (ToolKind::Math, q),
                Decision::Reason(q) => (ToolKind::Reason, q),
            };

            let observation = self
                .tools
                .execute(tool, &input)
                .await
                .map_err(|source| AgentError::Tool { tool, source })?;

            steps.push(AgentStep {
                tool: tool.name().to_string(),
                input,
                observation,
                log,
                call_id,
            });
        }

        tracing::warn!(
            max_iterations = self.max_iterations,
            "Agent hit the iteration limit without a final answer"
        );
        Ok(AgentOutcome {
            answer: ITERATION_LIMIT_ANSWER.to_string(),
            steps,
        })
    }
}

#[async_trait]
impl Agent for AgentExecutor {
    async fn respond(&self, transcript: &[Message]) -> Result<AgentOutcome, AgentError> {
        self.run(transcript).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedLlm;
    use crate::tools::testing::FakeTool;
    use crate::tools::ToolError;

    const MATH_ACTION: &str = " I should calculate.\nAction: math\nAction Input: 12 * (7 + 3)";

    fn executor(llm: ScriptedLlm, tools: ToolRegistry, max_iterations: usize) -> (AgentExecutor, Arc<ScriptedLlm>) {
        let llm = Arc::new(llm);
        let planner = ReactPlanner::new(llm.clone(), "m", &tools);
        (AgentExecutor::new(Box::new(planner), tools, max_iterations), llm)
    }

    fn question(text: &str) -> Vec<Message> {
        vec![
            Message::assistant("Hi I am a Chatbot who can solve math problems, How may I help?"),
            Message::user(text),
        ]
    }

    #[tokio::test]
    async fn runs_tool_then_returns_final_answer() {
        let math = FakeTool::ok(ToolKind::Math, "Answer: 120");
        let mut tools = ToolRegistry::new();
        tools.register(math.clone());

        let (agent, llm) = executor(
            ScriptedLlm::new()
                .reply(MATH_ACTION)
                .reply(" I now know the final answer\nFinal Answer: 120"),
            tools,
            15,
        );

        let outcome = agent.run(&question("What is 12 * (7 + 3)?")).await.unwrap();
        assert_eq!(outcome.answer, "120");
        assert_eq!(outcome.steps.len(), 1);
        assert_eq!(outcome.steps[0].tool, "math");
        assert_eq!(outcome.steps[0].observation, "Answer: 120");
        assert_eq!(*math.inputs.lock().unwrap(), vec!["12 * (7 + 3)".to_string()]);

        let second_prompt = llm.requests()[1][0].content.clone().unwrap();
        assert!(second_prompt.ends_with("Observation: Answer: 120\nThought: "));
    }

    #[tokio::test]
    async fn direct_answer_uses_no_tools() {
        let math = FakeTool::ok(ToolKind::Math, "unused");
        let mut tools = ToolRegistry::new();
        tools.register(math.clone());

        let (agent, _) = executor(ScriptedLlm::new().reply("Final Answer: Hello!"), tools, 15);
        let outcome = agent.run(&question("hello")).await.unwrap();
        assert_eq!(outcome.answer, "Hello!");
        assert!(outcome.steps.is_empty());
        assert_eq!(math.call_count(), 0);
    }

    #[tokio::test]
    async fn tool_failure_aborts_the_turn() {
        let mut tools = ToolRegistry::new();
        tools.register(FakeTool::failing(ToolKind::Search, "connection refused"));

        let (agent, llm) = executor(
            ScriptedLlm::new().reply("Action: search\nAction Input: weather today"),
            tools,
            15,
        );
        match agent.run(&question("weather?")).await {
            Err(AgentError::Tool { tool, source }) => {
                assert_eq!(tool, ToolKind::Search);
                assert!(matches!(source, ToolError::Request(_)));
            }
            other => panic!("expected tool error, got {:?}", other),
        }
        assert_eq!(llm.request_count(), 1);
    }

    #[tokio::test]
    async fn malformed_plan_aborts_before_any_tool() {
        let math = FakeTool::ok(ToolKind::Math, "Answer: 4");
        let mut tools = ToolRegistry::new();
        tools.register(math.clone());

        let (agent, _) = executor(
            ScriptedLlm::new().reply("Action: math\nAction Input: 2+2\nFinal Answer: 4"),
            tools,
            15,
        );
        assert!(matches!(
            agent.run(&question("2+2")).await,
            Err(AgentError::MalformedPlan(_))
        ));
        assert_eq!(math.call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_back_to_the_planner() {
        let math = FakeTool::ok(ToolKind::Math, "Answer: 1");
        let mut tools = ToolRegistry::new();
        tools.register(math.clone());
        tools.register(FakeTool::ok(ToolKind::Search, "unused"));

        let (agent, llm) = executor(
            ScriptedLlm::new()
                .reply("Action: python_repl\nAction Input: print(1)")
                .reply(" I now know the final answer\nFinal Answer: 1"),
            tools,
            15,
        );
        let outcome = agent.run(&question("print one")).await.unwrap();

        assert_eq!(outcome.answer, "1");
        assert_eq!(outcome.steps.len(), 1);
        assert_eq!(outcome.steps[0].tool, "python_repl");
        assert_eq!(
            outcome.steps[0].observation,
            "python_repl is not a valid tool, try one of [math, search]."
        );
        assert_eq!(math.call_count(), 0);

        let second_prompt = llm.requests()[1][0].content.clone().unwrap();
        assert!(second_prompt.contains("Observation: python_repl is not a valid tool"));
    }

    #[tokio::test]
    async fn repeated_unknown_tools_stop_at_iteration_limit() {
        let (agent, llm) = executor(
            ScriptedLlm::new()
                .reply("Action: slide_rule\nAction Input: 1")
                .reply("Action: abacus\nAction Input: 1"),
            ToolRegistry::new(),
            2,
        );
        let outcome = agent.run(&question("count")).await.unwrap();
        assert_eq!(outcome.answer, ITERATION_LIMIT_ANSWER);
        assert_eq!(outcome.steps.len(), 2);
        assert_eq!(llm.request_count(), 2);
    }

    #[tokio::test]
    async fn stops_at_iteration_limit() {
        let math = FakeTool::ok(ToolKind::Math, "Answer: 120");
        let mut tools = ToolRegistry::new();
        tools.register(math.clone());

        let (agent, llm) = executor(
            ScriptedLlm::new().reply(MATH_ACTION).reply(MATH_ACTION).reply(MATH_ACTION),
            tools,
            2,
        );
        let outcome = agent.run(&question("loop forever")).await.unwrap();
        assert_eq!(outcome.answer, ITERATION_LIMIT_ANSWER);
        assert_eq!(outcome.steps.len(), 2);
        assert_eq!(llm.request_count(), 2);
        assert_eq!(math.call_count(), 2);
    }

    #[test]
    fn builds_from_config_for_both_strategies() {
        let key = ApiKey::parse("gsk_test").unwrap();
        let mut config = Config::new(Some(key.clone()));
        assert!(AgentExecutor::from_config(&config, key.clone()).is_ok());

        config.strategy = AgentStrategy::ToolCalls;
        let agent = AgentExecutor::from_config(&config, key).unwrap();
        assert_eq!(agent.max_iterations, 15);
        assert_eq!(agent.tools.names().len(), 4);
    }
}
