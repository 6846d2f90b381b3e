//! WebSocket Message Types
//!
//! Envelope format exchanged over a connection:
//!
//! ```json
//! { "type": "send_message", "payload": { ... }, "timestamp": "2024-05-01T12:00:00Z" }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::hub::Frame;
use crate::application::dto::SendMessageRequest;
use crate::domain::{ChatMessage, GroupId};

/// Envelope kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    JoinGroup,
    LeaveGroup,
    SendMessage,
    /// Server to client only
    NewMessage,
}

impl EnvelopeKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "join_group" => Some(EnvelopeKind::JoinGroup),
            "leave_group" => Some(EnvelopeKind::LeaveGroup),
            "send_message" => Some(EnvelopeKind::SendMessage),
            "new_message" => Some(EnvelopeKind::NewMessage),
            _ => None,
        }
    }
}

/// Outgoing envelope
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    pub payload: T,
    pub timestamp: DateTime<Utc>,
}

/// Incoming envelope before its payload is typed. A client timestamp, if
/// any, is ignored.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

/// Group reference in `join_group`/`leave_group`: a bare id or an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GroupRef {
    Id(GroupId),
    Object {
        #[serde(alias = "id")]
        group_id: GroupId,
    },
}

impl GroupRef {
    fn group_id(self) -> GroupId {
        match self {
            GroupRef::Id(id) | GroupRef::Object { group_id: id } => id,
        }
    }
}

/// A decoded client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    JoinGroup(GroupId),
    LeaveGroup(GroupId),
    SendMessage(SendMessageRequest),
}

/// Why an inbound frame was dropped
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unknown envelope type: {0}")]
    UnknownKind(String),

    #[error("Envelope type {0:?} is server-to-client only")]
    ServerOnly(EnvelopeKind),

    #[error("Invalid {kind:?} payload: {source}")]
    InvalidPayload {
        kind: EnvelopeKind,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientEvent {
    /// Decode one inbound text frame.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let envelope: RawEnvelope = serde_json::from_str(raw)?;
        let kind = EnvelopeKind::parse(&envelope.kind)
            .ok_or_else(|| ProtocolError::UnknownKind(envelope.kind.clone()))?;

        let invalid = |source| ProtocolError::InvalidPayload { kind, source };

        match kind {
            EnvelopeKind::JoinGroup => serde_json::from_value::<GroupRef>(envelope.payload)
                .map(|group| ClientEvent::JoinGroup(group.group_id()))
                .map_err(invalid),
            EnvelopeKind::LeaveGroup => serde_json::from_value::<GroupRef>(envelope.payload)
                .map(|group| ClientEvent::LeaveGroup(group.group_id()))
                .map_err(invalid),
            EnvelopeKind::SendMessage => serde_json::from_value(envelope.payload)
                .map(ClientEvent::SendMessage)
                .map_err(invalid),
            EnvelopeKind::NewMessage => Err(ProtocolError::ServerOnly(kind)),
        }
    }
}

/// Encode a persisted message as a `new_message` frame.
pub fn new_message_frame(message: &ChatMessage) -> Result<Frame, serde_json::Error> {
    let envelope = Envelope {
        kind: EnvelopeKind::NewMessage,
        payload: message,
        timestamp: Utc::now(),
    };
    serde_json::to_string(&envelope).map(Frame::from)
}
