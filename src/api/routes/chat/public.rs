//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::chat::HistoryMessage;

/// Session used when a request doesn't name one
pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub message_id: i64,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub messages: Vec<HistoryMessage>,
}
