//! Router for the chat API

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use axum_extra::extract::Query;

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::api::utils::ClientId;
use crate::chat::ChatService;

type SharedState = Arc<RwLock<AppState>>;

fn chat_service(state: &SharedState) -> ChatService {
    state.read().expect("Unable to read share state").chat.clone()
}

/// Send a message and get the assistant's response
async fn chat_handler(
    State(state): State<SharedState>,
    ClientId(client_id): ClientId,
    payload: Result<Json<public::ChatRequest>, JsonRejection>,
) -> Result<Json<public::ChatResponse>, ApiError> {
    let service = chat_service(&state);

    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            // A bad body still counts against the client's quota
            service.check_rate_limit(&client_id)?;
            return Err(rejection.into());
        }
    };

    let session_id = payload
        .session_id
        .unwrap_or_else(|| public::DEFAULT_SESSION_ID.to_string());
    let message = payload.message.unwrap_or_default();

    let reply = service
        .handle_message(&session_id, &message, &client_id)
        .await?;

    Ok(Json(public::ChatResponse {
        success: true,
        response: reply.response,
        message_id: reply.message_id,
    }))
}

/// Start a new conversation for the session
async fn reset_handler(
    State(state): State<SharedState>,
    payload: Result<Json<public::ResetRequest>, JsonRejection>,
) -> Result<Json<public::ResetResponse>, ApiError> {
    let Json(payload) = payload?;
    let session_id = payload
        .session_id
        .unwrap_or_else(|| public::DEFAULT_SESSION_ID.to_string());

    chat_service(&state).reset(&session_id).await;

    Ok(Json(public::ResetResponse {
        success: true,
        message: String::from("Chat history cleared"),
    }))
}

/// Get the messages of the session's current conversation
async fn history_handler(
    State(state): State<SharedState>,
    Query(params): Query<public::HistoryQuery>,
) -> Result<Json<public::HistoryResponse>, ApiError> {
    let session_id = params
        .session_id
        .unwrap_or_else(|| public::DEFAULT_SESSION_ID.to_string());
    let messages = chat_service(&state).history(&session_id).await?;

    Ok(Json(public::HistoryResponse {
        success: true,
        messages,
    }))
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/reset", post(reset_handler))
        .route("/history", get(history_handler))
}
