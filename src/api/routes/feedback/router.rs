//! Router for the feedback API

use std::sync::{Arc, RwLock};

use axum::{Json, Router, extract::State, extract::rejection::JsonRejection, routing::post};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::chat::FeedbackOutcome;

type SharedState = Arc<RwLock<AppState>>;

const INVALID_RATING: &str = "Rating must be an integer between 1 and 5";

/// Rate a message. Submitting again for the same message replaces
/// the earlier rating.
async fn submit_feedback(
    State(state): State<SharedState>,
    payload: Result<Json<public::FeedbackRequest>, JsonRejection>,
) -> Result<Json<public::FeedbackResponse>, ApiError> {
    let Json(payload) = payload?;

    // Message IDs start at 1, a zero ID is treated as missing
    let message_id = payload
        .message_id
        .filter(|id| *id != 0)
        .ok_or_else(|| ApiError::bad_request("Message ID is required"))?;
    let rating = payload
        .rating
        .as_ref()
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ApiError::bad_request(INVALID_RATING))?;

    let service = state.read().expect("Unable to read share state").chat.clone();
    let outcome = service
        .submit_feedback(message_id, rating, payload.comment)
        .await?;

    let message = match outcome {
        FeedbackOutcome::Created(_) => "Feedback submitted successfully",
        FeedbackOutcome::Updated(_) => "Feedback updated successfully",
    };

    Ok(Json(public::FeedbackResponse {
        success: true,
        message: message.to_string(),
        feedback_id: outcome.id(),
    }))
}

/// Create the feedback router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", post(submit_feedback))
}
