//! Message History API Tests

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{json_body, TestApp};

#[tokio::test]
async fn test_group_history_in_send_order() {
    let app = TestApp::new();
    app.backend.add_member(7, 1);
    let token = app.backend.login(1);
    let (a, _rx) = app.connect(1);

    for content in ["first", "second", "third"] {
        app.send(
            a,
            json!({"type": "send_message", "payload": {"receiver_type": "group", "receiver_id": 7, "content": content}}),
        )
        .await;
    }

    let response = app
        .get_auth("/api/v1/messages/history/group/7", &token)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["count"], 3);
    let contents: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_group_history_forbidden_for_non_member() {
    let app = TestApp::new();
    let token = app.backend.login(5);

    let response = app
        .get_auth("/api/v1/messages/history/group/7", &token)
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_direct_history_contains_both_directions_only() {
    let app = TestApp::new();
    let token = app.backend.login(1);
    let (a, _a_rx) = app.connect(1);
    let (b, _b_rx) = app.connect(2);
    let (c, _c_rx) = app.connect(3);

    app.send(a, json!({"type": "send_message", "payload": {"receiver_type": "user", "receiver_id": 2, "content": "ping"}}))
        .await;
    app.send(b, json!({"type": "send_message", "payload": {"receiver_type": "user", "receiver_id": 1, "content": "pong"}}))
        .await;
    app.send(c, json!({"type": "send_message", "payload": {"receiver_type": "user", "receiver_id": 2, "content": "other"}}))
        .await;

    let response = app
        .get_auth("/api/v1/messages/history/user/2", &token)
        .await;

    let body = json_body(response).await;
    let contents: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["ping", "pong"]);
}

#[tokio::test]
async fn test_unknown_receiver_type_is_bad_request() {
    let app = TestApp::new();
    let token = app.backend.login(1);

    let response = app
        .get_auth("/api/v1/messages/history/channel/7", &token)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_requires_bearer_token() {
    let app = TestApp::new();

    let response = app.get("/api/v1/messages/history/user/2").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_direct_history_forbidden_without_conversation() {
    let app = TestApp::new();
    let token = app.backend.login(1);
    let (b, _b_rx) = app.connect(2);
    let (c, _c_rx) = app.connect(3);

    // Users 2 and 3 talk; user 1 never exchanged anything with user 2.
    app.send(b, json!({"type": "send_message", "payload": {"receiver_type": "user", "receiver_id": 3, "content": "private"}}))
        .await;
    app.send(c, json!({"type": "send_message", "payload": {"receiver_type": "user", "receiver_id": 2, "content": "reply"}}))
        .await;

    let response = app
        .get_auth("/api/v1/messages/history/user/2", &token)
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
