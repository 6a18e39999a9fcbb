//! Orchestrates a chat turn: rate limit, session lookup, model call
//! and persistence.

use std::sync::Arc;
use std::time::Duration;

use handlebars::Handlebars;
use tokio_rusqlite::Connection;

use super::db::{find_history_by_session_id, find_latest_chat_id, insert_message, upsert_feedback};
use super::error::ChatError;
use super::models::{ChatReply, FeedbackOutcome, HistoryMessage, Role};
use super::session::SessionChatCache;
use crate::ai::{SharedLanguageModel, request_failed};
use crate::ai::prompt::{educational_query, templates};
use crate::limiter::{RateLimitDecision, RateLimiter};

/// Cheap to clone, clones share the limiter and session state.
#[derive(Clone)]
pub struct ChatService {
    db: Connection,
    limiter: RateLimiter,
    sessions: SessionChatCache,
    llm: SharedLanguageModel,
    llm_timeout: Duration,
    templates: Arc<Handlebars<'static>>,
}

impl ChatService {
    pub fn new(
        db: Connection,
        limiter: RateLimiter,
        llm: SharedLanguageModel,
        llm_timeout: Duration,
    ) -> Self {
        Self {
            sessions: SessionChatCache::new(db.clone()),
            db,
            limiter,
            llm,
            llm_timeout,
            templates: Arc::new(templates()),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn sessions(&self) -> &SessionChatCache {
        &self.sessions
    }

    /// Count a request from `client_id` against its quota.
    pub fn check_rate_limit(&self, client_id: &str) -> Result<(), ChatError> {
        match self.limiter.check(client_id) {
            RateLimitDecision::Allowed => Ok(()),
            decision @ RateLimitDecision::Limited { .. } => Err(ChatError::RateLimited {
                retry_after_secs: decision.retry_after_secs(),
            }),
        }
    }

    /// Run one chat turn for `client_id` in `session_id`. The user's
    /// message is saved before the model is called and stays saved
    /// even if the model call fails.
    pub async fn handle_message(
        &self,
        session_id: &str,
        text: &str,
        client_id: &str,
    ) -> Result<ChatReply, ChatError> {
        self.check_rate_limit(client_id)?;

        if text.trim().is_empty() {
            return Err(ChatError::validation("No message provided"));
        }
        if session_id.trim().is_empty() {
            return Err(ChatError::validation("No session ID provided"));
        }

        let handle = self
            .sessions
            .get_or_create(session_id)
            .await
            .map_err(ChatError::persistence("Failed to start chat session"))?;

        insert_message(&self.db, handle.chat_id, Role::User, text)
            .await
            .map_err(ChatError::persistence("Failed to save user message"))?;

        let prompt = educational_query(&self.templates, text)
            .map_err(|e| ChatError::Upstream(e.to_string()))?;

        let response = match tokio::time::timeout(self.llm_timeout, self.llm.generate(&prompt)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(
                    session_id = %session_id,
                    model = %self.llm.model_name(),
                    "Error from language model: {}",
                    e
                );
                return Err(ChatError::Upstream(e.to_string()));
            }
            Err(_) => {
                tracing::error!(
                    session_id = %session_id,
                    timeout_secs = self.llm_timeout.as_secs(),
                    "Language model timed out"
                );
                let err = request_failed(format!("Request timed out after {:?}", self.llm_timeout));
                return Err(ChatError::Upstream(err.to_string()));
            }
        };

        let message_id = insert_message(&self.db, handle.chat_id, Role::Assistant, &response)
            .await
            .map_err(ChatError::persistence("Failed to save assistant message"))?;

        Ok(ChatReply {
            response,
            message_id,
        })
    }

    /// Start a fresh conversation for the session. Old messages stay
    /// in the database. Never fails, database errors are logged.
    pub async fn reset(&self, session_id: &str) {
        let cleared = self.sessions.clear(session_id).await;

        let has_history = match find_latest_chat_id(&self.db, session_id).await {
            Ok(chat_id) => chat_id.is_some(),
            Err(e) => {
                tracing::error!("Error resetting chat in database: {}", e);
                return;
            }
        };

        // Provision the new chat right away so history reads empty
        // until the next message
        if cleared.is_some() || has_history {
            if let Err(e) = self.sessions.get_or_create(session_id).await {
                tracing::error!("Error resetting chat in database: {}", e);
            }
        }
    }

    pub async fn submit_feedback(
        &self,
        message_id: i64,
        rating: i64,
        comment: Option<String>,
    ) -> Result<FeedbackOutcome, ChatError> {
        if !(1..=5).contains(&rating) {
            return Err(ChatError::validation(
                "Rating must be an integer between 1 and 5",
            ));
        }

        upsert_feedback(&self.db, message_id, rating, comment)
            .await
            .map_err(ChatError::persistence("Failed to submit feedback"))?
            .ok_or_else(|| {
                ChatError::NotFound(format!("Message with ID {} not found", message_id))
            })
    }

    pub async fn history(&self, session_id: &str) -> Result<Vec<HistoryMessage>, ChatError> {
        find_history_by_session_id(&self.db, session_id)
            .await
            .map_err(ChatError::persistence("Failed to retrieve chat history"))
    }
}
