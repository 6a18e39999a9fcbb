//! API routes module

pub mod chat;
pub mod feedback;

use std::sync::{Arc, RwLock};

use crate::api::public::ApiError;
use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

async fn not_found() -> ApiError {
    ApiError::not_found("Resource not found")
}

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Chat, reset and history routes
        .merge(chat::router())
        // Feedback routes
        .nest("/feedback", feedback::router())
        .fallback(not_found)
}
