//! HTTP API: sessions, chat turns and SSE streaming of agent steps.

mod routes;
mod sessions;
pub mod types;

pub use routes::{router, serve, AppState};
