//! User Repository Implementation
//!
//! Read-only access to the `users` table for display names and profiles.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{UserDirectory, UserId, UserProfile};
use crate::shared::error::AppError;

/// Database row for a profile lookup
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    username: String,
    nickname: Option<String>,
    avatar_url: Option<String>,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        UserProfile {
            id: row.id,
            username: row.username,
            nickname: row.nickname.filter(|n| !n.is_empty()),
            avatar_url: row.avatar_url.filter(|a| !a.is_empty()),
        }
    }
}

/// PostgreSQL user directory.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserRepository {
    async fn display_name(&self, user_id: UserId) -> Result<Option<String>, AppError> {
        let name = sqlx::query_scalar::<_, String>(
            r#"
            SELECT COALESCE(NULLIF(nickname, ''), username)
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(name)
    }

    async fn profiles(&self, user_ids: &[UserId]) -> Result<Vec<UserProfile>, AppError> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, username, nickname, avatar_url
            FROM users
            WHERE id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(UserProfile::from).collect())
    }
}
