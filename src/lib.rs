//! # search-chat
//!
//! A chat service whose answers come from a zero-shot ReAct agent that can
//! search Wikipedia, arXiv and the web.
//!
//! This library provides:
//! - An HTTP API for sessions, chat turns and streamed agent steps
//! - A tool-based agent loop over an OpenAI-compatible hosted model (Groq)
//! - Three lookup tools with capped, plain-text results
//!
//! ## Architecture
//!
//! Each turn follows the "tools in a loop" pattern:
//! 1. Append the user message to the session's conversation
//! 2. Build a fresh agent configuration from the turn's credential
//! 3. Call the LLM, parse its action, run the named tool, feed the result back
//! 4. Append the final answer, or a fixed fallback message if the run failed
//!
//! ## Example
//!
//! ```rust,ignore
//! use search_chat::{chat::{ChatService, TurnOptions}, session::Session, tools::ToolRegistry};
//!
//! let config = search_chat::Config::from_env()?;
//! let tools = std::sync::Arc::new(ToolRegistry::with_search_tools(&config.tools)?);
//! let chat = ChatService::new(config, tools);
//! let session = Session::new();
//! let reply = chat
//!     .run_turn(&session, "What is machine learning?", &TurnOptions::default(), &search_chat::agent::NoopObserver)
//!     .await;
//! ```

pub mod agent;
pub mod api;
pub mod chat;
pub mod config;
pub mod llm;
pub mod session;
pub mod tools;

pub use config::Config;
