//! Public API types

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use http::{HeaderValue, StatusCode, header};
use serde::Serialize;

use crate::chat::ChatError;

// Errors

/// Body of every failed response
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<String>,
    retry_after_secs: Option<u64>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &str) -> Self {
        Self {
            status,
            error: error.to_string(),
            details: None,
            retry_after_secs: None,
        }
    }

    pub fn bad_request(error: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn not_found(error: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Always log the error
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                details = ?self.details,
                "{}",
                self.error
            );
        } else {
            tracing::warn!(status = %self.status, "{}", self.error);
        }

        let body = ErrorResponse {
            success: false,
            error: self.error,
            details: self.details,
        };
        let mut response = (self.status, Json(body)).into_response();
        if let Some(secs) = self.retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let error = err.to_string();
        match err {
            ChatError::RateLimited { retry_after_secs } => Self {
                retry_after_secs: Some(retry_after_secs),
                ..Self::new(StatusCode::TOO_MANY_REQUESTS, &error)
            },
            ChatError::Validation(_) => Self::bad_request(&error),
            ChatError::NotFound(_) => Self::not_found(&error),
            ChatError::Upstream(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, &error),
            ChatError::Persistence { source, .. } => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, &error)
                    .with_details(format!("{:#}", source))
            }
        }
    }
}

/// A missing or malformed JSON body is reported with the same
/// envelope as every other error.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("No data provided").with_details(rejection.body_text())
    }
}

// Re-export public types from each route

pub mod chat {
    pub use crate::api::routes::chat::public::*;
}

pub mod feedback {
    pub use crate::api::routes::feedback::public::*;
}
