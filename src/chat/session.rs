//! The chat session controller.

use std::sync::Arc;

use crate::agent::{Agent, AgentError, AgentExecutor, AgentStep};
use crate::config::{Config, ConfigError};

use super::transcript::{ChatRole, Message, Transcript};

/// Greeting every transcript starts with.
pub const GREETING: &str = "Hi I am a Chatbot who can solve math problems, How may I help?";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("agent execution failed: {0}")]
    AgentExecution(#[from] AgentError),

    #[error("message is empty")]
    EmptyInput,
}

/// Result of a successful turn, for front-ends to render.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub answer: String,
    pub steps: Vec<AgentStep>,
}

/// One conversation: a transcript plus the agent answering in it.
///
/// Lifecycle is create, [`initialize`](Self::initialize), any number of
/// [`submit`](Self::submit) calls, then [`dispose`](Self::dispose). A session
/// without an agent has no credential and refuses every submission.
pub struct ChatSession {
    transcript: Transcript,
    agent: Option<Arc<dyn Agent>>,
}

impl ChatSession {
    pub fn new(agent: Option<Arc<dyn Agent>>) -> Self {
        Self {
            transcript: Transcript::new(),
            agent,
        }
    }

    /// Build a session whose agent uses the config's API key, if any.
    pub fn from_config(config: &Config) -> Result<Self, ChatError> {
        let agent = match &config.api_key {
            Some(key) => {
                let executor = AgentExecutor::from_config(config, key.clone())?;
                Some(Arc::new(executor) as Arc<dyn Agent>)
            }
            None => None,
        };
        Ok(Self::new(agent))
    }

    pub fn is_configured(&self) -> bool {
        self.agent.is_some()
    }

    /// Seed the greeting. Does nothing once the transcript has messages.
    pub fn initialize(&mut self) {
        if self.transcript.is_empty() {
            self.transcript.push(Message::assistant(GREETING));
        }
    }

    /// Run one turn.
    ///
    /// Without a credential this fails before touching the transcript. When
    /// the agent fails, the user message stays in the transcript and its turn
    /// is marked failed.
    pub async fn submit(&mut self, user_text: &str) -> Result<TurnOutcome, ChatError> {
        let agent = self
            .agent
            .clone()
            .ok_or(ChatError::Configuration(ConfigError::MissingApiKey))?;

        let text = user_text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyInput);
        }

        self.initialize();
        let user_index = self.transcript.push(Message::user(text));
        tracing::info!(turn = user_index, chars = text.len(), "Submitting user message");

        match agent.respond(self.transcript.messages()).await {
            Ok(outcome) => {
                self.transcript.push(Message::assistant(outcome.answer.clone()));
                Ok(TurnOutcome {
                    answer: outcome.answer,
                    steps: outcome.steps,
                })
            }
            Err(e) => {
                tracing::warn!(turn = user_index, error = %e, "Turn failed");
                self.transcript.mark_failed(user_index);
                Err(ChatError::AgentExecution(e))
            }
        }
    }

    /// Transcript as `(role, content)` pairs, in order.
    pub fn render(&self) -> impl Iterator<Item = (ChatRole, &str)> + '_ {
        self.transcript
            .messages()
            .iter()
            .map(|m| (m.role(), m.content()))
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// End the session and hand back its transcript.
    pub fn dispose(self) -> Transcript {
        tracing::debug!(messages = self.transcript.len(), "Disposing chat session");
        self.transcript
    }
}
