//! search-chat - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the chat API.

use search_chat::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional .env file; variables already set in the environment win
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "search_chat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = dotenv {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={}, streaming={}, credential={}",
        config.default_model,
        config.streaming,
        if config.api_key.is_some() { "env" } else { "per-turn" }
    );

    api::serve(config).await?;

    Ok(())
}
