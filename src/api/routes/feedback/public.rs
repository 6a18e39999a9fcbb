//! Public types for the feedback API
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub message_id: Option<i64>,
    // Left untyped so a non-integer rating is reported as a
    // validation error rather than a body parsing error
    pub rating: Option<Value>,
    pub comment: Option<String>,
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub message: String,
    pub feedback_id: i64,
}
