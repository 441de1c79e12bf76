//! Router construction and server startup.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::sessions;
use super::types::HealthResponse;
use crate::chat::ChatService;
use crate::config::Config;
use crate::session::SessionStore;
use crate::tools::ToolRegistry;

/// Shared state for every handler.
pub struct AppState {
    pub sessions: SessionStore,
    pub chat: ChatService,
}

impl AppState {
    pub fn new(chat: ChatService) -> Self {
        Self {
            sessions: SessionStore::new(),
            chat,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/sessions",
            post(sessions::create_session).get(sessions::list_sessions),
        )
        .route(
            "/api/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/api/sessions/:id/messages", post(sessions::send_message))
        .route(
            "/api/sessions/:id/messages/stream",
            post(sessions::stream_message),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the tool set once and serve the API until shutdown.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let tools = Arc::new(ToolRegistry::with_search_tools(&config.tools)?);
    tracing::info!(tools = ?tools.names(), "Registered tools");

    let addr = format!("{}:{}", config.host, config.port);
    let chat = ChatService::new(config, tools);
    let app = router(Arc::new(AppState::new(chat)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
