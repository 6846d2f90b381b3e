//! Envelope Dispatcher
//!
//! Routes one decoded client envelope: group subscriptions go straight to
//! the hub, messages go through the chat service and are then fanned out.
//! Nothing here ever answers the client with an error; rejected frames are
//! logged, counted and dropped.

use std::sync::Arc;

use super::hub::{ConnectionId, DeliveryReport, Hub};
use super::messages::{new_message_frame, ClientEvent};
use crate::application::services::{ChatService, MessageError};
use crate::domain::{GroupId, ReceiverType, UserId};
use crate::infrastructure::metrics;

/// The connection a frame arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
}

/// Why a frame had no effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Malformed or unrecognized envelope
    Protocol,
    /// Spoofed sender or non-member group send
    Unauthorized,
    /// The message could not be stored
    Persistence,
    /// The connection was already removed from the hub
    Unregistered,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::Protocol => "protocol",
            DropReason::Unauthorized => "unauthorized",
            DropReason::Persistence => "persistence",
            DropReason::Unregistered => "unregistered",
        }
    }
}

impl From<&MessageError> for DropReason {
    fn from(err: &MessageError) -> Self {
        match err {
            MessageError::Invalid(_) => DropReason::Protocol,
            MessageError::NotParticipant | MessageError::NotGroupMember(_) => {
                DropReason::Unauthorized
            }
            MessageError::Persistence(_) | MessageError::Store(_) => DropReason::Persistence,
        }
    }
}

/// What handling one frame did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Joined(GroupId),
    Left(GroupId),
    Delivered {
        message_id: i64,
        report: DeliveryReport,
    },
    Dropped(DropReason),
}

pub struct Dispatcher {
    hub: Arc<Hub>,
    chat: Arc<ChatService>,
}

impl Dispatcher {
    pub fn new(hub: Arc<Hub>, chat: Arc<ChatService>) -> Self {
        Self { hub, chat }
    }

    /// Handle one inbound text frame from `origin`.
    ///
    /// Frames from a connection the hub has already dropped have no effect.
    pub async fn dispatch(&self, origin: Origin, raw: &str) -> Outcome {
        if !self.hub.is_registered(origin.connection_id) {
            tracing::debug!(
                connection_id = %origin.connection_id,
                "Ignoring frame from unregistered connection"
            );
            return dropped(DropReason::Unregistered);
        }

        let event = match ClientEvent::decode(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(
                    connection_id = %origin.connection_id,
                    error = %e,
                    "Dropping malformed frame"
                );
                return dropped(DropReason::Protocol);
            }
        };

        match event {
            ClientEvent::JoinGroup(group_id) => {
                self.hub.join_group(group_id, origin.connection_id);
                Outcome::Joined(group_id)
            }
            ClientEvent::LeaveGroup(group_id) => {
                self.hub.leave_group(group_id, origin.connection_id);
                Outcome::Left(group_id)
            }
            ClientEvent::SendMessage(request) => {
                let message = match self.chat.send(origin.user_id, request).await {
                    Ok(message) => message,
                    Err(e) => {
                        let reason = DropReason::from(&e);
                        if reason == DropReason::Persistence {
                            tracing::warn!(user_id = origin.user_id, error = %e, "Dropping message");
                        } else {
                            tracing::debug!(user_id = origin.user_id, error = %e, "Dropping message");
                        }
                        return dropped(reason);
                    }
                };

                let frame = match new_message_frame(&message) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::error!(message_id = message.message_id, error = %e, "Failed to encode message");
                        return dropped(DropReason::Protocol);
                    }
                };

                let report = match message.receiver_type {
                    ReceiverType::Group => self.hub.send_to_group(message.receiver_id, &frame),
                    ReceiverType::User => self
                        .hub
                        .send_to_users(&[message.sender_id, message.receiver_id], &frame),
                };

                tracing::debug!(
                    message_id = message.message_id,
                    delivered = report.delivered,
                    evicted = report.evicted,
                    "Message fanned out"
                );

                Outcome::Delivered {
                    message_id: message.message_id,
                    report,
                }
            }
        }
    }
}

fn dropped(reason: DropReason) -> Outcome {
    metrics::record_dropped_frame(reason.as_str());
    Outcome::Dropped(reason)
}
