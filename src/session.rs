//! Conversation store and in-memory session registry.
//!
//! A session owns exactly one [`Conversation`]. Conversations are append-only:
//! messages are added at the end and never edited or evicted.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

/// Assistant message every new conversation starts with.
pub const GREETING: &str = "Hi, I'm a chatbot who can search the web. How can I help you?";

/// Author of a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single role-tagged chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, append-only message log.
///
/// Role alternation is not enforced; two user messages in a row are stored
/// as given.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// A conversation seeded with the assistant greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![Message::assistant(GREETING)],
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// One user session: its conversation plus a lock that admits one turn at a time.
pub struct Session {
    pub id: Uuid,
    pub created_at: String,
    conversation: RwLock<Conversation>,
    turn_lock: Arc<Mutex<()>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now().to_rfc3339(),
            conversation: RwLock::new(Conversation::new()),
            turn_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn append(&self, message: Message) {
        self.conversation.write().await.append(message);
    }

    /// Snapshot of every message, oldest first.
    pub async fn messages(&self) -> Vec<Message> {
        self.conversation.read().await.all().to_vec()
    }

    pub async fn message_count(&self) -> usize {
        self.conversation.read().await.len()
    }

    /// Claim the session for one turn. Returns `None` while another turn runs.
    pub fn try_begin_turn(&self) -> Option<OwnedMutexGuard<()>> {
        self.turn_lock.clone().try_lock_owned().ok()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory session registry (non-persistent).
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new());
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        tracing::info!(session_id = %session.id, "Session created");
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// All sessions, newest first.
    pub async fn list(&self) -> Vec<Arc<Session>> {
        let mut sessions: Vec<Arc<Session>> =
            self.sessions.read().await.values().cloned().collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions
    }

    /// End a session. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Session ended");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_conversation_holds_only_the_greeting() {
        let conversation = Conversation::new();
        assert_eq!(conversation.all(), &[Message::assistant(GREETING)]);
    }

    #[test]
    fn append_keeps_order_and_allows_repeated_roles() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("first"));
        conversation.append(Message::user("second"));

        let contents: Vec<&str> = conversation
            .all()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec![GREETING, "first", "second"]);
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(Message::user("hi")).expect("serialize");
        assert_eq!(json["role"], "user");
    }

    #[tokio::test]
    async fn turn_lock_admits_one_turn_at_a_time() {
        let session = Session::new();
        let guard = session.try_begin_turn().expect("first turn");
        assert!(session.try_begin_turn().is_none());
        drop(guard);
        assert!(session.try_begin_turn().is_some());
    }

    #[tokio::test]
    async fn store_creates_gets_and_removes_sessions() {
        let store = SessionStore::new();
        let session = store.create().await;

        let fetched = store.get(session.id).await.expect("session exists");
        assert_eq!(fetched.message_count().await, 1);
        assert_eq!(store.list().await.len(), 1);

        assert!(store.remove(session.id).await);
        assert!(!store.remove(session.id).await);
        assert!(store.get(session.id).await.is_none());
    }
}
