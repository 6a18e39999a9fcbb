//! Test utilities for integration tests
#![allow(dead_code)]
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{Router, body::Body, http::Request};
use mockito::{Mock, ServerGuard};
use serde_json::Value;
use tokio_rusqlite::Connection;

use tutor::api::AppState;
use tutor::api::app;
use tutor::core::AppConfig;
use tutor::core::db::initialize_db;
use tutor::gemini::GeminiClient;
use tutor::limiter::RateLimitConfig;

pub const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

/// Creates a test application router backed by an in memory database
/// that sends model requests to `gemini_url`.
pub async fn test_app(gemini_url: &str) -> Router {
    let (app, _db) = test_app_with_config(test_config(gemini_url)).await;
    app
}

pub async fn test_app_with_rate_limit(gemini_url: &str, rate_limit: RateLimitConfig) -> Router {
    let config = AppConfig {
        rate_limit,
        ..test_config(gemini_url)
    };
    let (app, _db) = test_app_with_config(config).await;
    app
}

pub fn test_config(gemini_url: &str) -> AppConfig {
    AppConfig {
        storage_path: String::from("./"),
        db_path: String::from("./db"),
        static_path: String::from("./web"),
        gemini_api_hostname: gemini_url.to_string(),
        gemini_api_key: String::from("test-api-key"),
        gemini_model: String::from("gemini-1.5-flash"),
        llm_timeout: Duration::from_secs(5),
        rate_limit: RateLimitConfig::default(),
        rate_limit_sweep_interval: Duration::from_secs(60),
        // Lets tests act as different clients by setting the header
        trust_forwarded_for: true,
    }
}

/// Like `test_app` but with a custom config. Also returns the db so
/// tests can inspect or tamper with it.
pub async fn test_app_with_config(app_config: AppConfig) -> (Router, Connection) {
    let db = Connection::open_in_memory()
        .await
        .expect("Failed to open in memory db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to migrate db");
        Ok(())
    })
    .await
    .unwrap();

    let llm = GeminiClient::new(
        &app_config.gemini_api_hostname,
        &app_config.gemini_api_key,
        &app_config.gemini_model,
        app_config.llm_timeout,
    );
    let app_state = AppState::new(db.clone(), app_config, Arc::new(llm));
    (app(Arc::new(RwLock::new(app_state))), db)
}

/// Mock a successful `generateContent` call that replies with `text`.
pub async fn mock_gemini_reply(server: &mut ServerGuard, text: &str) -> Mock {
    let body = serde_json::json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }]
    });
    server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn chat_request(session_id: &str, message: &str) -> Request<Body> {
    json_request(
        "POST",
        "/api/chat",
        serde_json::json!({
            "session_id": session_id,
            "message": message,
        }),
    )
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_to_json(body: Body) -> Value {
    serde_json::from_str(&body_to_string(body).await).unwrap()
}
