//! Group Member Repository Implementation
//!
//! PostgreSQL implementation of the GroupMembership trait.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{GroupId, GroupMembership, UserId};
use crate::shared::error::AppError;

/// PostgreSQL group membership lookup against the `group_members` table.
#[derive(Clone)]
pub struct PgGroupMemberRepository {
    pool: PgPool,
}

impl PgGroupMemberRepository {
    /// Create a new PgGroupMemberRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupMembership for PgGroupMemberRepository {
    async fn is_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM group_members
                WHERE group_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
