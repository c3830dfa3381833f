//! Prompt preset handler integration tests

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::common::{assert_error, request, TestApp};

#[tokio::test]
async fn test_create_prompt_is_inactive() {
    let app = TestApp::new();

    let (status, body) = app
        .json(request(
            Method::POST,
            "/v1/prompts",
            Some(json!({ "name": "Pirate", "content": "Answer like a pirate." })),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Pirate");
    assert_eq!(body["is_active"], false);

    let (_, body) = app.json(request(Method::GET, "/v1/prompts/active", None)).await;
    assert!(body.is_null());
}

#[tokio::test]
async fn test_create_prompt_blank_fields_return_400() {
    let app = TestApp::new();

    for payload in [
        json!({ "name": "", "content": "something" }),
        json!({ "name": "name", "content": "" }),
        json!({ "name": "name", "content": "   " }),
    ] {
        let (status, body) = app
            .json(request(Method::POST, "/v1/prompts", Some(payload)))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error(&body, "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_activating_prompt_deactivates_others() {
    let app = TestApp::new();
    let first = app.create_prompt("First", "one").await;
    let second = app.create_prompt("Second", "two").await;

    for id in [first, second] {
        let (status, body) = app
            .json(request(
                Method::PUT,
                &format!("/v1/prompts/{id}/active"),
                Some(json!({ "active": true })),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_active"], true);
    }

    let (_, body) = app.json(request(Method::GET, "/v1/prompts", None)).await;
    let active: Vec<u64> = body
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["is_active"] == true)
        .map(|p| p["id"].as_u64().unwrap())
        .collect();
    assert_eq!(active, vec![second]);

    let (_, body) = app.json(request(Method::GET, "/v1/prompts/active", None)).await;
    assert_eq!(body["id"], second);
}

#[tokio::test]
async fn test_deactivating_prompt() {
    let app = TestApp::new();
    let id = app.create_prompt("Only", "content").await;
    let uri = format!("/v1/prompts/{id}/active");

    app.json(request(Method::PUT, &uri, Some(json!({ "active": true }))))
        .await;
    let (status, body) = app
        .json(request(Method::PUT, &uri, Some(json!({ "active": false }))))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (_, body) = app.json(request(Method::GET, "/v1/prompts/active", None)).await;
    assert!(body.is_null());
}

#[tokio::test]
async fn test_delete_prompt() {
    let app = TestApp::new();
    let id = app.create_prompt("Temp", "content").await;

    let response = app
        .send(request(Method::DELETE, &format!("/v1/prompts/{id}"), None))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (_, body) = app.json(request(Method::GET, "/v1/prompts", None)).await;
    assert_eq!(body, json!([]));

    let (status, body) = app
        .json(request(Method::DELETE, &format!("/v1/prompts/{id}"), None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "NOT_FOUND");
}

#[tokio::test]
async fn test_set_active_unknown_prompt_returns_404() {
    let app = TestApp::new();

    let (status, _) = app
        .json(request(
            Method::PUT,
            "/v1/prompts/42/active",
            Some(json!({ "active": true })),
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
