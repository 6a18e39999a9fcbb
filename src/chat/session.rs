//! In-memory mapping of session IDs to the chat they write to.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Error, Result};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_rusqlite::Connection;

use super::db::create_chat;

/// Handle for an active conversation. The model is stateless so the
/// handle only tracks which persisted chat new messages belong to.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionHandle {
    pub session_id: String,
    pub chat_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Lazily creates one `SessionHandle` per session ID. Handles live
/// until `clear` is called or the process exits.
#[derive(Clone)]
pub struct SessionChatCache {
    db: Connection,
    // Held across the chat insert so concurrent first messages for a
    // session only ever create one chat record. The lock is shared by
    // all sessions, first messages of unrelated sessions wait on each
    // other's insert.
    handles: Arc<Mutex<HashMap<String, SessionHandle>>>,
}

impl SessionChatCache {
    pub fn new(db: Connection) -> Self {
        Self {
            db,
            handles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return the handle for `session_id`, creating it and a new chat
    /// record on first use.
    pub async fn get_or_create(&self, session_id: &str) -> Result<SessionHandle, Error> {
        let mut handles = self.handles.lock().await;
        if let Some(handle) = handles.get(session_id) {
            return Ok(handle.clone());
        }

        let chat_id = create_chat(&self.db, session_id).await?;
        let handle = SessionHandle {
            session_id: session_id.to_string(),
            chat_id,
            created_at: Utc::now(),
        };
        tracing::info!(session_id = %session_id, chat_id, "Started new chat");
        handles.insert(session_id.to_string(), handle.clone());

        Ok(handle)
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.handles.lock().await.get(session_id).cloned()
    }

    /// Forget the handle for `session_id`. Persisted messages are not
    /// touched, the next `get_or_create` starts a new chat.
    pub async fn clear(&self, session_id: &str) -> Option<SessionHandle> {
        let handle = self.handles.lock().await.remove(session_id)?;
        tracing::info!(
            session_id = %session_id,
            chat_id = handle.chat_id,
            age_secs = (Utc::now() - handle.created_at).num_seconds(),
            "Cleared chat session"
        );
        Some(handle)
    }

    pub async fn len(&self) -> usize {
        self.handles.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
