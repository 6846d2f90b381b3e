//! Request DTOs
//!
//! Data structures for client-submitted payloads.

use serde::Deserialize;
use validator::Validate;

use crate::domain::{MessageType, ReceiverType, UserId};

/// Maximum message content length in characters
pub const MAX_CONTENT_LENGTH: u64 = 4000;

/// Body of a `send_message` envelope.
///
/// Server-assigned fields (`message_id`, `sent_at`, `sender_name`) are
/// ignored if a client sends them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct SendMessageRequest {
    /// Declared sender. The stored sender is always the authenticated user.
    #[serde(default)]
    pub sender_id: Option<UserId>,

    pub receiver_type: ReceiverType,

    pub receiver_id: i64,

    #[serde(default)]
    #[validate(length(max = MAX_CONTENT_LENGTH, message = "Content must be at most 4000 characters"))]
    pub content: String,

    #[serde(default)]
    pub message_type: MessageType,

    #[validate(length(max = 255, message = "File URL must be at most 255 characters"))]
    pub file_url: Option<String>,

    #[validate(length(max = 255, message = "File name must be at most 255 characters"))]
    pub file_name: Option<String>,

    #[validate(range(min = 0, message = "File size cannot be negative"))]
    pub file_size: Option<i64>,
}
