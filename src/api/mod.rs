//! HTTP API module.
//!
//! Endpoints:
//! - `GET /api/health` - service health and configured model
//! - `POST /api/sessions` - start a chat session
//! - `GET /api/sessions/:id` - rendered transcript
//! - `POST /api/sessions/:id/messages` - run one turn
//! - `DELETE /api/sessions/:id` - dispose a session
//!
//! Sessions unused for `SESSION_IDLE_SECS` are disposed by a background sweep.

mod routes;
mod sessions;
pub mod types;

use std::sync::Arc;

use tracing::info;

use crate::config::Config;

pub use routes::{router, AgentFactory, AppState};
pub use sessions::{spawn_idle_sweeper, SessionEntry, SessionStore, SharedSession};

/// Bind the configured address and serve until the process exits.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    if config.api_key.is_none() {
        info!("GROQ_API_KEY is not set; sessions must provide an api_key");
    }

    let state = Arc::new(AppState::new(config));
    spawn_idle_sweeper(state.sessions.clone(), state.config.session_idle);

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
