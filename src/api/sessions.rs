//! Session and chat-turn handlers.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::Stream;
use tokio::sync::{mpsc, OwnedMutexGuard};
use uuid::Uuid;

use super::routes::AppState;
use super::types::{SendMessageRequest, SendMessageResponse, SessionResponse, SessionSummary};
use crate::agent::{AgentEvent, EventLog};
use crate::chat::TurnOptions;
use crate::session::Session;

type ApiError = (StatusCode, String);

async fn session_response(session: &Session) -> SessionResponse {
    SessionResponse {
        id: session.id,
        created_at: session.created_at.clone(),
        messages: session.messages().await,
    }
}

async fn require_session(state: &AppState, id: Uuid) -> Result<Arc<Session>, ApiError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Session {} not found", id)))
}

/// Validate the request and claim the session for one turn.
async fn begin_turn(
    state: &AppState,
    id: Uuid,
    req: &SendMessageRequest,
) -> Result<(Arc<Session>, OwnedMutexGuard<()>), ApiError> {
    if req.content.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message content is empty".to_string()));
    }
    let session = require_session(state, id).await?;
    let guard = session.try_begin_turn().ok_or_else(|| {
        (
            StatusCode::CONFLICT,
            format!("Session {} already has a turn in progress", id),
        )
    })?;
    Ok((session, guard))
}

fn turn_options(req: &SendMessageRequest) -> TurnOptions {
    TurnOptions {
        api_key: req.api_key.clone(),
        model: req.model.clone(),
    }
}

/// POST /api/sessions - Start a session seeded with the greeting.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SessionResponse>) {
    let session = state.sessions.create().await;
    (StatusCode::CREATED, Json(session_response(&session).await))
}

/// GET /api/sessions - List sessions, newest first.
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionSummary>> {
    let mut summaries = Vec::new();
    for session in state.sessions.list().await {
        summaries.push(SessionSummary {
            id: session.id,
            created_at: session.created_at.clone(),
            message_count: session.message_count().await,
        });
    }
    Json(summaries)
}

/// GET /api/sessions/:id - Session with every message.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = require_session(&state, id).await?;
    Ok(Json(session_response(&session).await))
}

/// DELETE /api/sessions/:id - End a session and drop its conversation.
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("Session {} not found", id)))
    }
}

/// POST /api/sessions/:id/messages - Run one turn and return the reply.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let (session, _guard) = begin_turn(&state, id, &req).await?;

    let log = EventLog::new();
    let reply = state
        .chat
        .run_turn(&session, &req.content, &turn_options(&req), &log)
        .await;

    Ok(Json(SendMessageResponse {
        message: reply.message,
        error: reply.error,
        events: log.into_events(),
    }))
}

/// POST /api/sessions/:id/messages/stream - Run one turn, streaming agent events via SSE.
///
/// Emits one event per agent step, then a final `reply` event carrying the
/// appended assistant message.
pub async fn stream_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let (session, guard) = begin_turn(&state, id, &req).await?;
    let options = turn_options(&req);
    let chat = state.chat.clone();
    let (tx, mut rx) = mpsc::unbounded_channel::<AgentEvent>();

    // The turn runs to completion even if the client disconnects.
    let turn = tokio::spawn(async move {
        let _guard = guard;
        let observer = move |event: AgentEvent| {
            let _ = tx.send(event);
        };
        chat.run_turn(&session, &req.content, &options, &observer)
            .await
    });

    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            match Event::default().event(event.event_name()).json_data(&event) {
                Ok(sse) => yield Ok(sse),
                Err(e) => {
                    tracing::error!(
                        session_id = %id,
                        event = %event.event_name(),
                        error = %e,
                        "Failed to serialize SSE event; dropping"
                    );
                }
            }
        }

        match turn.await {
            Ok(reply) => match Event::default().event("reply").json_data(&reply) {
                Ok(sse) => yield Ok(sse),
                Err(e) => tracing::error!(session_id = %id, "Failed to serialize reply event: {e}"),
            },
            Err(e) => {
                tracing::error!(session_id = %id, "Turn task failed: {e}");
                yield Ok(Event::default().event("error").data("turn failed"));
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    ))
}
