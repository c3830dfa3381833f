//! Cross-domain invariant tests
//!
//! End-to-end checks of the rules that span stores, the response
//! function and the stream consumer.

use axum::http::{Method, StatusCode};
use bytes::Bytes;
use parley_chat::respond::INLINE_ERROR_MESSAGE;
use parley_llm::{delta_chunk, LlmError, LlmRole, MockLlmService};
use serde_json::json;

use crate::common::{event_names, request, TestApp};

mod test_history_invariants {
    use super::*;

    #[tokio::test]
    async fn test_error_messages_never_reach_the_model() {
        let app = TestApp::with_llm(MockLlmService::failing(LlmError::RateLimit));
        app.create_conversation(None).await;
        app.submit("first try").await;
        assert_eq!(app.llm.call_count(), 1);

        let (_, body) = app.json(request(Method::GET, "/v1/conversations/current", None)).await;
        let messages = body["conversation"]["messages"].as_array().unwrap().clone();
        assert_eq!(messages[1]["content"], INLINE_ERROR_MESSAGE);

        let history: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| json!({ "role": m["role"], "content": m["content"] }))
            .chain(std::iter::once(json!({ "role": "user", "content": "second try" })))
            .collect();

        let echo = TestApp::new();
        echo.send(request(
            Method::POST,
            "/api/chat",
            Some(json!({ "messages": history })),
        ))
        .await;

        let sent = &echo.llm.recorded_requests()[0].messages;
        let contents: Vec<&str> = sent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first try", "second try"]);
        assert!(sent.iter().all(|m| m.role == LlmRole::User));
    }

    #[tokio::test]
    async fn test_only_error_history_makes_no_call() {
        let app = TestApp::new();

        let (status, _) = app
            .json(request(
                Method::POST,
                "/api/chat",
                Some(json!({ "messages": [
                    { "role": "assistant", "content": INLINE_ERROR_MESSAGE },
                ] })),
            ))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.llm.call_count(), 0);
    }
}

mod test_stream_invariants {
    use super::*;

    #[tokio::test]
    async fn test_malformed_chunk_is_skipped() {
        let app = TestApp::with_llm(MockLlmService::with_chunks(vec![
            delta_chunk("Hel"),
            Bytes::from_static(b"{\"type\":\"content_block_delta\",\"delta\":{\"te"),
            delta_chunk("lo"),
        ]));

        let (_, frames) = app.submit("hi").await;

        assert_eq!(
            event_names(&frames),
            vec!["message", "pending", "pending", "message", "done"]
        );
        assert_eq!(frames[3].data["content"], "Hello");
    }

    #[tokio::test]
    async fn test_empty_response_commits_nothing() {
        let app = TestApp::with_llm(MockLlmService::with_chunks(vec![
            Bytes::from_static(b"{\"type\":\"message_start\",\"message\":{}}\n"),
            Bytes::from_static(b"{\"type\":\"message_stop\"}\n"),
        ]));

        let (_, frames) = app.submit("hi").await;
        assert_eq!(event_names(&frames), vec!["message", "done"]);

        let id = frames[0].data["conversation_id"].as_u64().unwrap();
        let (_, body) = app
            .json(request(
                Method::GET,
                &format!("/v1/conversations/{id}/messages"),
                None,
            ))
            .await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_mid_stream_discards_partial_content() {
        let app = TestApp::with_llm(MockLlmService::with_items(vec![
            Ok(delta_chunk("partial")),
            Err(LlmError::Connection("connection reset".to_string())),
        ]));
        let id = app.create_conversation(None).await;

        let (_, frames) = app.submit("hi").await;

        assert_eq!(
            event_names(&frames),
            vec!["message", "pending", "message", "error", "done"]
        );

        let (_, body) = app
            .json(request(
                Method::GET,
                &format!("/v1/conversations/{id}/messages"),
                None,
            ))
            .await;
        let contents: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(contents, vec!["hi", INLINE_ERROR_MESSAGE]);
    }
}

mod test_identifier_invariants {
    use super::*;

    #[tokio::test]
    async fn test_message_ids_strictly_increase() {
        let app = TestApp::new();

        app.submit("one").await;
        app.submit("two").await;

        let (_, body) = app.json(request(Method::GET, "/v1/conversations/current", None)).await;
        let ids: Vec<u64> = body["conversation"]["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_u64().unwrap())
            .collect();

        assert_eq!(ids.len(), 4);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}
