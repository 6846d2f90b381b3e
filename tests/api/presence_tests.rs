//! Presence API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{json_body, TestApp};

#[tokio::test]
async fn test_presence_requires_bearer_token() {
    let app = TestApp::new();

    let response = app.get("/api/v1/presence/online").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_online_users_lists_each_user_once_with_profiles() {
    let app = TestApp::new();
    let token = app.backend.login(9);
    app.backend.set_name(1, "alice");
    app.backend.set_name(3, "carol");
    let _conns = [app.connect(3), app.connect(3), app.connect(1)];

    let response = app.get_auth("/api/v1/presence/online", &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "online_users": [1, 3],
            "users": [
                { "id": 1, "username": "user1", "nickname": "alice", "avatar_url": null },
                { "id": 3, "username": "user3", "nickname": "carol", "avatar_url": null }
            ],
            "count": 2
        })
    );
}

#[tokio::test]
async fn test_online_users_without_profiles() {
    let app = TestApp::new();
    let token = app.backend.login(9);
    let _conn = app.connect(4);

    let response = app.get_auth("/api/v1/presence/online", &token).await;

    assert_eq!(
        json_body(response).await,
        json!({ "online_users": [4], "users": [], "count": 1 })
    );
}

#[tokio::test]
async fn test_user_connections() {
    let app = TestApp::new();
    let token = app.backend.login(9);
    let (first, _a) = app.connect(3);
    let (second, _b) = app.connect(3);

    let response = app
        .get_auth("/api/v1/presence/users/3/connections", &token)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user_id"], 3);
    assert_eq!(body["count"], 2);

    let ids: Vec<String> = body["connections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["connection_id"].as_str().unwrap().to_owned())
        .collect();
    assert!(ids.contains(&first.connection_id.to_string()));
    assert!(ids.contains(&second.connection_id.to_string()));
}

#[tokio::test]
async fn test_user_without_connections() {
    let app = TestApp::new();
    let token = app.backend.login(9);

    let response = app
        .get_auth("/api/v1/presence/users/42/connections", &token)
        .await;

    assert_eq!(
        json_body(response).await,
        json!({ "user_id": 42, "connections": [], "count": 0 })
    );
}
