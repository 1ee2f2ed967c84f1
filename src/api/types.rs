//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentStep;
use crate::chat::{ChatRole, Transcript};

/// Request to start a chat session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Groq API key for this session (falls back to `GROQ_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Request to submit a user message.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitMessageRequest {
    pub content: String,
}

/// A transcript message as rendered to clients.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,

    /// True for a user message whose turn produced no reply
    pub failed: bool,
}

impl MessageView {
    pub fn from_transcript(transcript: &Transcript) -> Vec<Self> {
        transcript
            .messages()
            .iter()
            .enumerate()
            .map(|(i, m)| Self {
                role: m.role(),
                content: m.content().to_string(),
                created_at: m.created_at(),
                failed: transcript.is_failed(i),
            })
            .collect()
    }
}

/// Session state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,

    /// Whether the session has a credential and can answer
    pub configured: bool,

    /// A turn is running; `messages` is the transcript before it started
    pub busy: bool,

    pub messages: Vec<MessageView>,
}

/// Turn status enumeration.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Completed,
    Failed,
}

/// Result of submitting a message.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub status: TurnStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Tool calls the agent made during the turn
    pub steps: Vec<AgentStep>,

    pub messages: Vec<MessageView>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
}
