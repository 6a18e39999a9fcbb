//! Integration tests for the feedback API endpoint

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use serial_test::serial;
    use tower::util::ServiceExt;

    use crate::test_utils::{body_to_json, chat_request, json_request, mock_gemini_reply, test_app};

    /// Sends one chat message and returns the assistant message ID
    async fn chat_once(app: &Router, session_id: &str) -> i64 {
        let response = app
            .clone()
            .oneshot(chat_request(session_id, "Explain gravity"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_to_json(response.into_body()).await["message_id"]
            .as_i64()
            .unwrap()
    }

    async fn post_feedback(app: &Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/feedback", body))
            .await
            .unwrap();
        let status = response.status();
        (status, body_to_json(response.into_body()).await)
    }

    /// Tests submitting feedback and then updating it
    #[tokio::test]
    #[serial]
    async fn it_submits_then_updates_feedback() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_gemini_reply(&mut server, "Mass attracts mass.").await;
        let app = test_app(&server.url()).await;
        let message_id = chat_once(&app, "feedback").await;

        let (status, body) = post_feedback(
            &app,
            json!({"message_id": message_id, "rating": 4, "comment": "Clear"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Feedback submitted successfully");
        let feedback_id = body["feedback_id"].as_i64().unwrap();

        let (status, body) = post_feedback(
            &app,
            json!({"message_id": message_id, "rating": 2, "comment": "Too short"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Feedback updated successfully");
        assert_eq!(body["feedback_id"].as_i64().unwrap(), feedback_id);

        // History shows only the latest rating
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/history?session_id=feedback")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        let messages = body["messages"].as_array().unwrap();
        assert!(messages[0].get("feedback").is_none());
        assert_eq!(
            messages[1]["feedback"],
            json!({"rating": 2, "comment": "Too short"})
        );
    }

    /// Tests feedback for a message that doesn't exist
    #[tokio::test]
    #[serial]
    async fn it_returns_404_for_unknown_message() {
        let server = mockito::Server::new_async().await;
        let app = test_app(&server.url()).await;

        let (status, body) = post_feedback(&app, json!({"message_id": 12345, "rating": 5})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Message with ID 12345 not found");
    }

    /// Tests feedback without a message ID
    #[tokio::test]
    #[serial]
    async fn it_returns_400_for_missing_message_id() {
        let server = mockito::Server::new_async().await;
        let app = test_app(&server.url()).await;

        for body in [json!({"rating": 5}), json!({"message_id": 0, "rating": 5})] {
            let (status, body) = post_feedback(&app, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Message ID is required");
        }
    }

    /// Tests ratings outside 1 to 5 or that aren't integers
    #[tokio::test]
    #[serial]
    async fn it_returns_400_for_invalid_ratings() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_gemini_reply(&mut server, "Answer").await;
        let app = test_app(&server.url()).await;
        let message_id = chat_once(&app, "ratings").await;

        for rating in [json!(0), json!(6), json!(4.5), json!("5"), json!(true), Value::Null] {
            let (status, body) =
                post_feedback(&app, json!({"message_id": message_id, "rating": rating})).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "rating {}", rating);
            assert_eq!(body["error"], "Rating must be an integer between 1 and 5");
        }
    }
}
