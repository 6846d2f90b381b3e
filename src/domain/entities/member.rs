//! Durable group membership lookup.
//!
//! Membership records are owned by the group management service; the hub
//! only asks whether a user currently belongs to a group before accepting
//! a message addressed to it.

use async_trait::async_trait;

use crate::shared::error::AppError;

use super::{GroupId, UserId};

/// Read-only view of the `group_members` table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupMembership: Send + Sync {
    /// Whether `user_id` is a durable member of `group_id`.
    async fn is_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<bool, AppError>;
}
