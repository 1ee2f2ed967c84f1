//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::agent::{Agent, AgentError, AgentExecutor};
use crate::chat::{ChatError, ChatSession};
use crate::config::{ApiKey, Config};

use super::sessions::SessionStore;
use super::types::*;

/// Builds the agent for a new session.
pub type AgentFactory =
    Arc<dyn Fn(&Config, ApiKey) -> Result<Arc<dyn Agent>, AgentError> + Send + Sync>;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    agent_factory: AgentFactory,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let factory: AgentFactory = Arc::new(
            |config: &Config, key: ApiKey| -> Result<Arc<dyn Agent>, AgentError> {
                let agent = AgentExecutor::from_config(config, key)?;
                Ok(Arc::new(agent))
            },
        );
        Self::with_agent_factory(config, factory)
    }

    pub fn with_agent_factory(config: Config, agent_factory: AgentFactory) -> Self {
        Self {
            config,
            sessions: SessionStore::new(),
            agent_factory,
        }
    }

    /// A request-supplied key wins; a blank one falls back to the environment.
    fn resolve_key(&self, requested: Option<&str>) -> Option<ApiKey> {
        requested
            .and_then(|raw| ApiKey::parse(raw).ok())
            .or_else(|| self.config.api_key.clone())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/messages", post(submit_message))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.config.model.clone(),
    })
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionResponse>), (StatusCode, String)> {
    let req = body.map(|Json(r)| r).unwrap_or_default();

    let agent = match state.resolve_key(req.api_key.as_deref()) {
        Some(key) => {
            let config = state.config.with_api_key(key.clone());
            let agent = (state.agent_factory)(&config, key).map_err(|e| {
                tracing::error!(error = %e, "Failed to build agent");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            })?;
            Some(agent)
        }
        None => None,
    };

    let mut session = ChatSession::new(agent);
    session.initialize();
    let configured = session.is_configured();
    let messages = MessageView::from_transcript(session.transcript());

    let (id, _) = state.sessions.insert(session).await;
    tracing::info!(session_id = %id, configured, "Session created");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            id,
            configured,
            busy: false,
            messages,
        }),
    ))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let entry = state.sessions.get(id).await.ok_or_else(|| not_found(id))?;

    // Never wait behind a running turn; serve the last finished transcript.
    let (messages, busy) = match entry.try_lock() {
        Ok(session) => (MessageView::from_transcript(session.transcript()), false),
        Err(_) => (entry.snapshot().await, true),
    };

    Ok(Json(SessionResponse {
        id,
        configured: entry.is_configured(),
        busy,
        messages,
    }))
}

async fn submit_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitMessageRequest>,
) -> Result<Response, (StatusCode, String)> {
    let entry = state.sessions.get(id).await.ok_or_else(|| not_found(id))?;
    let mut session = entry.lock().await;

    let result = session.submit(&req.content).await;
    let messages = entry.publish(&session).await;

    match result {
        Ok(turn) => Ok(Json(TurnResponse {
            status: TurnStatus::Completed,
            answer: Some(turn.answer),
            error: None,
            steps: turn.steps,
            messages,
        })
        .into_response()),
        Err(ChatError::EmptyInput) => Err((
            StatusCode::BAD_REQUEST,
            "content is required".to_string(),
        )),
        Err(e @ ChatError::Configuration(_)) => Err((StatusCode::PRECONDITION_FAILED, e.to_string())),
        Err(e @ ChatError::AgentExecution(_)) => {
            tracing::error!(session_id = %id, error = %e, "Turn failed");
            let body = TurnResponse {
                status: TurnStatus::Failed,
                answer: None,
                error: Some(e.to_string()),
                steps: Vec::new(),
                messages,
            };
            Ok((StatusCode::BAD_GATEWAY, Json(body)).into_response())
        }
    }
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let entry = state.sessions.remove(id).await.ok_or_else(|| not_found(id))?;

    match Arc::try_unwrap(entry) {
        Ok(entry) => {
            let transcript = entry.into_session().dispose();
            tracing::info!(session_id = %id, messages = transcript.len(), "Session disposed");
        }
        // A turn still holds the session; it is dropped when that turn ends.
        Err(_) => tracing::info!(session_id = %id, "Session removed while a turn is running"),
    }
    Ok(StatusCode::NO_CONTENT)
}

fn not_found(id: Uuid) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("session {} not found", id))
}
