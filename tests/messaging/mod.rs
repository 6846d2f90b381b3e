//! Hub and dispatcher scenarios against in-memory collaborators.

use std::sync::atomic::Ordering;

use pretty_assertions::assert_eq;
use serde_json::json;

use chat_hub::domain::ReceiverType;
use chat_hub::presentation::websocket::{DeliveryReport, DropReason, Outcome};

use crate::common::{drain, TestApp};

fn group_message(group_id: i64, content: &str) -> serde_json::Value {
    json!({
        "type": "send_message",
        "payload": {"receiver_type": "group", "receiver_id": group_id, "content": content},
        "timestamp": "2024-05-01T12:00:00Z"
    })
}

#[tokio::test]
async fn test_group_message_end_to_end() {
    let app = TestApp::new();
    app.backend.add_member(7, 1);
    app.backend.add_member(7, 2);
    app.backend.set_name(1, "alice");

    let (a, mut a_rx) = app.connect(1);
    let (b, mut b_rx) = app.connect(2);
    app.send(a, json!({"type": "join_group", "payload": 7})).await;
    app.send(b, json!({"type": "join_group", "payload": {"group_id": 7}})).await;

    let outcome = app.send(a, group_message(7, "hi")).await;

    let Outcome::Delivered { message_id, report } = outcome else {
        panic!("expected delivery, got {:?}", outcome);
    };
    assert_eq!(report, DeliveryReport { delivered: 2, evicted: 0 });

    let received = drain(&mut b_rx);
    assert_eq!(received.len(), 1);
    let frame = &received[0];
    assert_eq!(frame["type"], "new_message");
    assert_eq!(frame["payload"]["content"], "hi");
    assert_eq!(frame["payload"]["message_id"], message_id);
    assert_eq!(frame["payload"]["sender_id"], 1);
    assert_eq!(frame["payload"]["sender_name"], "alice");
    assert!(frame["payload"]["sent_at"].is_string());

    // Mirrored to the sender's own subscribed connection
    assert_eq!(drain(&mut a_rx).len(), 1);

    let stored = app.backend.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].sender_id, 1);
    assert_eq!(stored[0].receiver_type, ReceiverType::Group);
    assert_eq!(stored[0].receiver_id, 7);
    assert_eq!(stored[0].content, "hi");
}

#[tokio::test]
async fn test_non_member_group_send_has_no_effect() {
    let app = TestApp::new();
    app.backend.add_member(7, 2);

    let (intruder, _rx) = app.connect(5);
    let (b, mut b_rx) = app.connect(2);
    // Session-scoped subscription is not durable membership
    app.send(intruder, json!({"type": "join_group", "payload": 7})).await;
    app.send(b, json!({"type": "join_group", "payload": 7})).await;

    let outcome = app.send(intruder, group_message(7, "let me in")).await;

    assert_eq!(outcome, Outcome::Dropped(DropReason::Unauthorized));
    assert!(drain(&mut b_rx).is_empty());
    assert!(app.backend.stored().is_empty());
}

#[tokio::test]
async fn test_direct_message_reaches_every_connection_of_both_users() {
    let app = TestApp::new();
    let (a, mut a_rx) = app.connect(1);
    let (_b1, mut b1_rx) = app.connect(2);
    let (_b2, mut b2_rx) = app.connect(2);
    let (_c, mut c_rx) = app.connect(3);

    let outcome = app
        .send(
            a,
            json!({"type": "send_message", "payload": {"sender_id": 1, "receiver_type": "user", "receiver_id": 2, "content": "yo"}}),
        )
        .await;

    assert!(matches!(outcome, Outcome::Delivered { report, .. } if report.delivered == 3));
    assert_eq!(drain(&mut a_rx).len(), 1);
    assert_eq!(drain(&mut b1_rx).len(), 1);
    assert_eq!(drain(&mut b2_rx).len(), 1);
    assert!(drain(&mut c_rx).is_empty());
}

#[tokio::test]
async fn test_spoofed_sender_is_dropped() {
    let app = TestApp::new();
    let (mallory, _rx) = app.connect(5);
    let (_b, mut b_rx) = app.connect(2);

    let outcome = app
        .send(
            mallory,
            json!({"type": "send_message", "payload": {"sender_id": 1, "receiver_type": "user", "receiver_id": 2, "content": "from alice"}}),
        )
        .await;

    assert_eq!(outcome, Outcome::Dropped(DropReason::Unauthorized));
    assert!(drain(&mut b_rx).is_empty());
    assert!(app.backend.stored().is_empty());
}

#[tokio::test]
async fn test_persistence_failure_sends_nothing() {
    let app = TestApp::new();
    app.backend.fail_persist.store(true, Ordering::SeqCst);
    let (a, mut a_rx) = app.connect(1);
    let (_b, mut b_rx) = app.connect(2);

    let outcome = app
        .send(
            a,
            json!({"type": "send_message", "payload": {"receiver_type": "user", "receiver_id": 2, "content": "lost"}}),
        )
        .await;

    assert_eq!(outcome, Outcome::Dropped(DropReason::Persistence));
    assert!(drain(&mut a_rx).is_empty());
    assert!(drain(&mut b_rx).is_empty());
}

#[tokio::test]
async fn test_disconnected_connection_leaves_all_groups() {
    let app = TestApp::new();
    let hub = &app.state.hub;
    let (a, mut a_rx) = app.connect(1);
    let (b, _b_rx) = app.connect(2);
    for group in [3, 9] {
        app.send(a, json!({"type": "join_group", "payload": group})).await;
        app.send(b, json!({"type": "join_group", "payload": group})).await;
    }

    hub.unregister(a.connection_id);
    hub.unregister(a.connection_id);

    for group in [3, 9] {
        let frame = chat_hub::presentation::websocket::Frame::from_static("{}");
        assert_eq!(hub.send_to_group(group, &frame).delivered, 1);
        assert!(!hub.group_members(group).contains(&a.connection_id));
    }
    assert!(a_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_malformed_frames_do_not_disturb_the_connection() {
    let app = TestApp::new();
    let (a, _rx) = app.connect(1);

    for frame in [
        json!({"type": "new_message", "payload": {}}),
        json!({"type": "join_group", "payload": "seven"}),
        json!({"kind": "join_group"}),
    ] {
        assert_eq!(app.send(a, frame).await, Outcome::Dropped(DropReason::Protocol));
    }

    assert!(app.state.hub.is_registered(a.connection_id));
}
