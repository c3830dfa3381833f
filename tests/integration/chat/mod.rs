//! Chat handler integration tests: raw response stream and submit flow

use axum::http::{header, Method, StatusCode};
use parley_chat::respond::INLINE_ERROR_MESSAGE;
use parley_llm::{delta_chunk, LlmError, MockLlmService};
use serde_json::{json, Value};

use crate::common::{assert_error, event_names, read_bytes, request, TestApp};

mod test_generate {
    use super::*;

    fn ndjson_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str::<Value>(l).unwrap())
            .filter(|v| v["type"] == "content_block_delta")
            .map(|v| v["delta"]["text"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_generate_streams_ndjson_events() {
        let app = TestApp::new();

        let response = app
            .send(request(
                Method::POST,
                "/api/chat",
                Some(json!({ "messages": [{ "role": "user", "content": "hi" }] })),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/x-ndjson"
        );
        let bytes = read_bytes(response).await;
        assert_eq!(ndjson_text(&bytes), "Mock response to: hi");
    }

    #[tokio::test]
    async fn test_generate_appends_enabled_override() {
        let app = TestApp::new();

        app.send(request(
            Method::POST,
            "/api/chat",
            Some(json!({
                "messages": [{ "role": "user", "content": "hi" }],
                "system_prompt": { "value": "Reply in French.", "enabled": true },
            })),
        ))
        .await;

        let system = app.llm.recorded_requests()[0].system_prompt.clone().unwrap();
        assert!(system.ends_with("\n\nReply in French."));
    }

    #[tokio::test]
    async fn test_generate_without_valid_messages_returns_400() {
        let app = TestApp::new();

        let (status, body) = app
            .json(request(
                Method::POST,
                "/api/chat",
                Some(json!({ "messages": [
                    { "role": "user", "content": "   " },
                    { "role": "assistant", "content": INLINE_ERROR_MESSAGE },
                ] })),
            ))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error(&body, "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "No valid messages to send");
        assert_eq!(app.llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_provider_errors_map_to_status() {
        let cases = [
            (LlmError::RateLimit, StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
            (
                LlmError::Connection("refused".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
            ),
            (
                LlmError::Authentication("invalid x-api-key".to_string()),
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_ERROR",
            ),
            (
                LlmError::MissingApiKey,
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
            ),
        ];

        for (error, status, code) in cases {
            let app = TestApp::with_llm(MockLlmService::failing(error));

            let (actual, body) = app
                .json(request(
                    Method::POST,
                    "/api/chat",
                    Some(json!({ "messages": [{ "role": "user", "content": "hi" }] })),
                ))
                .await;

            assert_eq!(actual, status);
            assert_error(&body, code);
        }
    }

    #[tokio::test]
    async fn test_generate_does_not_touch_stores() {
        let app = TestApp::new();

        app.send(request(
            Method::POST,
            "/api/chat",
            Some(json!({ "messages": [{ "role": "user", "content": "hi" }] })),
        ))
        .await;

        let (_, body) = app.json(request(Method::GET, "/v1/conversations", None)).await;
        assert_eq!(body, json!([]));
    }
}

mod test_submit {
    use super::*;

    #[tokio::test]
    async fn test_submit_streams_pending_then_message() {
        let app = TestApp::with_llm(MockLlmService::with_chunks(vec![
            delta_chunk("Hel"),
            delta_chunk("lo"),
        ]));

        let (status, frames) = app.submit("Say hello").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            event_names(&frames),
            vec!["message", "pending", "pending", "message", "done"]
        );
        assert_eq!(frames[0].data["role"], "user");
        assert_eq!(frames[0].data["content"], "Say hello");
        assert_eq!(frames[1].data["content"], "Hel");
        assert_eq!(frames[2].data["content"], "Hello");
        assert_eq!(frames[3].data["role"], "assistant");
        assert_eq!(frames[3].data["content"], "Hello");
        assert_eq!(frames[3].data["id"], frames[2].data["id"]);
        assert_eq!(frames[4].data["conversation_id"], frames[0].data["conversation_id"]);
    }

    #[tokio::test]
    async fn test_submit_creates_titled_conversation() {
        let app = TestApp::new();

        let (_, frames) = app
            .submit("  Explain ownership and borrowing in Rust please  ")
            .await;
        let id = frames[0].data["conversation_id"].as_u64().unwrap();

        let (_, body) = app
            .json(request(Method::GET, &format!("/v1/conversations/{id}"), None))
            .await;
        assert_eq!(body["title"], "Explain ownership and borrowin");

        let contents: Vec<&str> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(
            contents,
            vec![
                "Explain ownership and borrowing in Rust please",
                "Mock response to: Explain ownership and borrowing in Rust please",
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_uses_current_conversation() {
        let app = TestApp::new();
        let id = app.create_conversation(Some("Existing")).await;

        let (_, frames) = app.submit("hello").await;

        assert_eq!(frames[0].data["conversation_id"], id);
        let (_, body) = app.json(request(Method::GET, "/v1/conversations", None)).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_blank_input_returns_400() {
        let app = TestApp::new();

        let (status, body) = app
            .json(request(
                Method::POST,
                "/v1/chat",
                Some(json!({ "content": "  \n " })),
            ))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error(&body, "VALIDATION_ERROR");
        assert_eq!(app.llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_failure_without_conversation_sets_banner() {
        let app = TestApp::with_llm(MockLlmService::failing(LlmError::Authentication(
            "invalid x-api-key".to_string(),
        )));

        let (status, frames) = app.submit("hello").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(event_names(&frames), vec!["message", "error", "done"]);
        assert_eq!(
            frames[1].data["message"],
            "Authentication failed. Please check your Anthropic API key."
        );

        let (_, body) = app.json(request(Method::GET, "/v1/chat/status", None)).await;
        assert_eq!(body["is_loading"], false);
        assert_eq!(
            body["error"],
            "Authentication failed. Please check your Anthropic API key."
        );
    }

    #[tokio::test]
    async fn test_submit_failure_in_current_conversation_is_inline() {
        let app = TestApp::with_llm(MockLlmService::failing(LlmError::RateLimit));
        let id = app.create_conversation(None).await;

        let (_, frames) = app.submit("hello").await;

        assert_eq!(event_names(&frames), vec!["message", "message", "error", "done"]);
        assert_eq!(frames[1].data["content"], INLINE_ERROR_MESSAGE);

        let (_, body) = app.json(request(Method::GET, "/v1/chat/status", None)).await;
        assert!(body["error"].is_null());

        let (_, body) = app
            .json(request(
                Method::GET,
                &format!("/v1/conversations/{id}/messages"),
                None,
            ))
            .await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[1]["role"], "assistant");
        assert_eq!(body[1]["content"], INLINE_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_submit_with_active_prompt() {
        let app = TestApp::new();
        let prompt = app.create_prompt("Pirate", "Answer like a pirate.").await;
        app.send(request(
            Method::PUT,
            &format!("/v1/prompts/{prompt}/active"),
            Some(json!({ "active": true })),
        ))
        .await;

        app.submit("hello").await;

        let system = app.llm.recorded_requests()[0].system_prompt.clone().unwrap();
        assert!(system.ends_with("\n\nAnswer like a pirate."));
    }

    #[tokio::test]
    async fn test_status_idle_after_submission() {
        let app = TestApp::new();

        let (_, body) = app.json(request(Method::GET, "/v1/chat/status", None)).await;
        assert_eq!(body, json!({ "is_loading": false, "error": null }));

        app.submit("hello").await;

        let (_, body) = app.json(request(Method::GET, "/v1/chat/status", None)).await;
        assert_eq!(body["is_loading"], false);
    }
}
