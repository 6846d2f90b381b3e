//! Chat Message Service
//!
//! Authorizes, persists and enriches messages submitted over a live
//! connection, and serves time-ordered history.

use std::sync::Arc;

use validator::Validate;

use crate::application::dto::SendMessageRequest;
use crate::domain::{
    ChatMessage, GroupId, GroupMembership, HistoryFilter, MessageRepository, NewChatMessage,
    ReceiverType, UserDirectory, UserId, UserProfile,
};

/// Message service errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Invalid message: {0}")]
    Invalid(String),

    #[error("Sender is neither the declared sender nor the receiver")]
    NotParticipant,

    #[error("User is not a member of group {0}")]
    NotGroupMember(GroupId),

    #[error("Failed to persist message: {0}")]
    Persistence(String),

    #[error("Store error: {0}")]
    Store(String),
}

/// Coordinates the message store, membership checks and sender names.
pub struct ChatService {
    messages: Arc<dyn MessageRepository>,
    members: Arc<dyn GroupMembership>,
    users: Arc<dyn UserDirectory>,
}

impl ChatService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        members: Arc<dyn GroupMembership>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            messages,
            members,
            users,
        }
    }

    /// Accept a message from `sender`, store it exactly once and return the
    /// persisted form ready for delivery.
    ///
    /// Nothing is stored when authorization fails.
    pub async fn send(
        &self,
        sender: UserId,
        request: SendMessageRequest,
    ) -> Result<ChatMessage, MessageError> {
        request
            .validate()
            .map_err(|e| MessageError::Invalid(e.to_string()))?;

        self.authorize(sender, &request).await?;

        let draft = NewChatMessage {
            sender_id: sender,
            receiver_type: request.receiver_type,
            receiver_id: request.receiver_id,
            message_type: request.message_type,
            content: request.content,
            file_url: request.file_url,
            file_name: request.file_name,
            file_size: request.file_size,
        };

        let stored = self
            .messages
            .persist(&draft)
            .await
            .map_err(|e| MessageError::Persistence(e.to_string()))?;

        let sender_name = self.sender_name(sender).await;

        tracing::debug!(
            message_id = stored.id,
            sender_id = sender,
            receiver_type = %draft.receiver_type,
            receiver_id = draft.receiver_id,
            "Message persisted"
        );

        Ok(ChatMessage::from_persisted(draft, stored, sender_name))
    }

    /// History of a conversation as seen by `caller`.
    ///
    /// Direct history is always the caller's own two-party conversation
    /// and is refused when the two users have never exchanged a message;
    /// group history requires durable membership.
    pub async fn history(
        &self,
        caller: UserId,
        receiver_type: ReceiverType,
        receiver_id: i64,
    ) -> Result<Vec<ChatMessage>, MessageError> {
        let filter = match receiver_type {
            ReceiverType::User => HistoryFilter::Direct {
                user_id: caller,
                peer_id: receiver_id,
            },
            ReceiverType::Group => {
                let is_member = self
                    .members
                    .is_group_member(receiver_id, caller)
                    .await
                    .map_err(|e| MessageError::Store(e.to_string()))?;
                if !is_member {
                    return Err(MessageError::NotGroupMember(receiver_id));
                }
                HistoryFilter::Group {
                    group_id: receiver_id,
                }
            }
        };

        let history = self
            .messages
            .fetch_history(filter)
            .await
            .map_err(|e| MessageError::Store(e.to_string()))?;

        if receiver_type == ReceiverType::User && history.is_empty() {
            return Err(MessageError::NotParticipant);
        }

        Ok(history)
    }

    /// Profiles of the given users. Unknown ids are skipped.
    pub async fn profiles(&self, user_ids: &[UserId]) -> Result<Vec<UserProfile>, MessageError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.users
            .profiles(user_ids)
            .await
            .map_err(|e| MessageError::Store(e.to_string()))
    }

    /// Check that the message store is reachable.
    pub async fn ping_store(&self) -> Result<(), String> {
        self.messages.ping().await.map_err(|e| e.to_string())
    }

    async fn authorize(
        &self,
        sender: UserId,
        request: &SendMessageRequest,
    ) -> Result<(), MessageError> {
        match request.receiver_type {
            ReceiverType::User => {
                let declared = request.sender_id.unwrap_or(sender);
                if sender != declared && sender != request.receiver_id {
                    return Err(MessageError::NotParticipant);
                }
                Ok(())
            }
            ReceiverType::Group => {
                let group_id = request.receiver_id;
                match self.members.is_group_member(group_id, sender).await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(MessageError::NotGroupMember(group_id)),
                    Err(e) => {
                        // Unverifiable membership is treated as non-membership.
                        tracing::warn!(
                            group_id = group_id,
                            user_id = sender,
                            error = %e,
                            "Membership lookup failed"
                        );
                        Err(MessageError::NotGroupMember(group_id))
                    }
                }
            }
        }
    }

    async fn sender_name(&self, sender: UserId) -> String {
        match self.users.display_name(sender).await {
            Ok(Some(name)) => name,
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(user_id = sender, error = %e, "Failed to resolve sender name");
                String::new()
            }
        }
    }
}
