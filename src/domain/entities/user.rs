//! User display names and public profiles.

use async_trait::async_trait;
use serde::Serialize;

use crate::shared::error::AppError;

use super::UserId;

/// Public profile shown in presence listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
}

/// Resolves how a user is shown to other participants.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Nickname when set, otherwise username. `None` if the user does not exist.
    async fn display_name(&self, user_id: UserId) -> Result<Option<String>, AppError>;

    /// Profiles of the listed users, ordered by id. Unknown ids are skipped.
    async fn profiles(&self, user_ids: &[UserId]) -> Result<Vec<UserProfile>, AppError>;
}
