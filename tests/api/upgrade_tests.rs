//! WebSocket Upgrade Tests
//!
//! Real handshakes against a bound listener: authenticate, register,
//! run the pumps, and tear down when the client goes away.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::common::TestApp;

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Serve the app's router on an ephemeral port.
async fn serve(app: &TestApp) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    addr
}

async fn connect(addr: SocketAddr, token: &str) -> WsStream {
    let (ws, _) = connect_async(format!("ws://{}/ws/connect?token={}", addr, token))
        .await
        .unwrap();
    ws
}

/// Poll until `condition` holds; registration happens after the handshake
/// response, so the hub may lag the client by a moment.
async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let waited = timeout(TIMEOUT, async {
        while !condition() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not reached in time");
}

async fn next_json(ws: &mut WsStream) -> Value {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("timeout waiting for frame")
            .expect("stream closed")
            .expect("ws error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send_json(ws: &mut WsStream, frame: Value) {
    ws.send(Message::text(frame.to_string())).await.unwrap();
}

#[tokio::test]
async fn test_handshake_registers_and_close_unregisters() {
    let app = TestApp::new();
    let addr = serve(&app).await;
    let token = app.backend.login(1);
    let hub = app.state.hub.clone();

    let mut ws = connect(addr, &token).await;

    eventually(|| hub.connection_count() == 1).await;
    assert_eq!(hub.online_users(), vec![1]);
    let sessions = hub.user_connections(1);
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].remote_addr.is_some());

    ws.close(None).await.unwrap();

    eventually(|| hub.connection_count() == 0).await;
    assert!(hub.online_users().is_empty());
}

#[tokio::test]
async fn test_refused_credential_fails_the_handshake() {
    let app = TestApp::new();
    let addr = serve(&app).await;

    let result = connect_async(format!("ws://{}/ws/connect?token=not-a-token", addr)).await;

    match result {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 401),
        other => panic!("expected an HTTP 401 refusal, got {:?}", other.map(|_| ())),
    }
    assert_eq!(app.state.hub.connection_count(), 0);
}

#[tokio::test]
async fn test_group_message_travels_between_real_sockets() {
    let app = TestApp::new();
    let addr = serve(&app).await;
    app.backend.add_member(7, 1);
    app.backend.add_member(7, 2);
    app.backend.set_name(1, "alice");
    let hub = app.state.hub.clone();

    let mut alice = connect(addr, &app.backend.login(1)).await;
    let mut bob = connect(addr, &app.backend.login(2)).await;
    eventually(|| hub.connection_count() == 2).await;

    send_json(&mut alice, json!({"type": "join_group", "payload": 7})).await;
    send_json(&mut bob, json!({"type": "join_group", "payload": {"group_id": 7}})).await;
    eventually(|| hub.group_members(7).len() == 2).await;

    send_json(
        &mut alice,
        json!({"type": "send_message", "payload": {"receiver_type": "group", "receiver_id": 7, "content": "hi"}}),
    )
    .await;

    let received = next_json(&mut bob).await;
    assert_eq!(received["type"], "new_message");
    assert_eq!(received["payload"]["content"], "hi");
    assert_eq!(received["payload"]["sender_id"], 1);
    assert_eq!(received["payload"]["sender_name"], "alice");
    assert!(received["payload"]["message_id"].is_number());

    let echoed = next_json(&mut alice).await;
    assert_eq!(echoed["payload"]["message_id"], received["payload"]["message_id"]);
    assert_eq!(app.backend.stored().len(), 1);

    drop(alice);
    eventually(|| hub.connection_count() == 1).await;
    assert_eq!(hub.group_members(7).len(), 1);
}
