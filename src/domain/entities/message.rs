//! Chat message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

use super::{GroupId, UserId};

/// Who a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiverType {
    /// Direct message to a single user
    User,
    /// Message to every member of a group
    Group,
}

impl ReceiverType {
    /// Parse the database / URL representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "group" => Some(Self::Group),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
        }
    }
}

impl std::fmt::Display for ReceiverType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Message content types matching the `message_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Plain text
    #[default]
    Text,
    Image,
    Audio,
    Video,
    File,
}

impl MessageType {
    /// Convert from database string representation.
    /// Unknown values fall back to `Text`.
    pub fn from_db(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "image" => Self::Image,
            "audio" => Self::Audio,
            "video" => Self::Video,
            "file" => Self::File,
            _ => Self::Text,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::File => "file",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message that has been authorized but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    pub sender_id: UserId,
    pub receiver_type: ReceiverType,
    pub receiver_id: i64,
    pub message_type: MessageType,
    pub content: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
}

/// Server-assigned identity of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedMessage {
    pub id: i64,
    pub sent_at: DateTime<Utc>,
}

/// A persisted chat message as delivered to clients.
///
/// `message_id` and `sent_at` come from the store and are authoritative.
/// Once stored a message is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: i64,
    pub sender_id: UserId,
    pub sender_name: String,
    pub receiver_type: ReceiverType,
    pub receiver_id: i64,
    pub content: String,
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Combine a draft with the identity the store assigned to it.
    pub fn from_persisted(draft: NewChatMessage, stored: PersistedMessage, sender_name: String) -> Self {
        Self {
            message_id: stored.id,
            sender_id: draft.sender_id,
            sender_name,
            receiver_type: draft.receiver_type,
            receiver_id: draft.receiver_id,
            content: draft.content,
            message_type: draft.message_type,
            file_url: draft.file_url,
            file_name: draft.file_name,
            file_size: draft.file_size,
            sent_at: stored.sent_at,
        }
    }
}

/// Which conversation a history scan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFilter {
    /// Both directions of a two-party conversation
    Direct { user_id: UserId, peer_id: UserId },
    /// Everything addressed to a group
    Group { group_id: GroupId },
}

/// Durable append-only message store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append a message, returning its assigned id and send time.
    /// Ids increase monotonically.
    async fn persist(&self, message: &NewChatMessage) -> Result<PersistedMessage, AppError>;

    /// Messages matching the filter in ascending send-time order.
    async fn fetch_history(&self, filter: HistoryFilter) -> Result<Vec<ChatMessage>, AppError>;

    /// Connectivity check used by the readiness probe.
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
