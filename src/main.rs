//! mathbot - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes chat sessions.

use mathbot::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mathbot=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        model = %config.model,
        strategy = ?config.strategy,
        "Loaded configuration"
    );

    api::serve(config).await
}
