//! Message Repository Implementation
//!
//! PostgreSQL implementation of the append-only message store.
//!
//! Expected `messages` table (owned by the schema migrations of the
//! account/group service):
//!
//! ```sql
//! CREATE TABLE messages (
//!     id            BIGSERIAL PRIMARY KEY,
//!     sender_id     BIGINT NOT NULL REFERENCES users(id),
//!     receiver_type TEXT   NOT NULL CHECK (receiver_type IN ('user', 'group')),
//!     receiver_id   BIGINT NOT NULL,
//!     message_type  TEXT   NOT NULL DEFAULT 'text',
//!     content       TEXT   NOT NULL DEFAULT '',
//!     file_url      VARCHAR(255),
//!     file_name     VARCHAR(255),
//!     file_size     BIGINT,
//!     sent_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{
    ChatMessage, HistoryFilter, MessageRepository, MessageType, NewChatMessage, PersistedMessage,
    ReceiverType,
};
use crate::shared::error::AppError;

/// PostgreSQL message repository implementation.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for history queries, joined with the sender's name.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    sender_id: i64,
    sender_name: String,
    receiver_type: String,
    receiver_id: i64,
    message_type: String,
    content: String,
    file_url: Option<String>,
    file_name: Option<String>,
    file_size: Option<i64>,
    sent_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self, fallback: ReceiverType) -> ChatMessage {
        ChatMessage {
            message_id: self.id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            receiver_type: ReceiverType::parse(&self.receiver_type).unwrap_or(fallback),
            receiver_id: self.receiver_id,
            content: self.content,
            message_type: MessageType::from_db(&self.message_type),
            file_url: self.file_url,
            file_name: self.file_name,
            file_size: self.file_size,
            sent_at: self.sent_at,
        }
    }
}

const HISTORY_COLUMNS: &str = r#"
    SELECT m.id, m.sender_id,
           COALESCE(NULLIF(u.nickname, ''), u.username, '') AS sender_name,
           m.receiver_type::text AS receiver_type, m.receiver_id,
           m.message_type::text AS message_type, m.content,
           m.file_url, m.file_name, m.file_size, m.sent_at
    FROM messages m
    LEFT JOIN users u ON u.id = m.sender_id
"#;

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn persist(&self, message: &NewChatMessage) -> Result<PersistedMessage, AppError> {
        let (id, sent_at) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            r#"
            INSERT INTO messages (
                sender_id, receiver_type, receiver_id, message_type,
                content, file_url, file_name, file_size
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, sent_at
            "#,
        )
        .bind(message.sender_id)
        .bind(message.receiver_type.as_str())
        .bind(message.receiver_id)
        .bind(message.message_type.as_str())
        .bind(&message.content)
        .bind(&message.file_url)
        .bind(&message.file_name)
        .bind(message.file_size)
        .fetch_one(&self.pool)
        .await?;

        Ok(PersistedMessage { id, sent_at })
    }

    /// Time-ordered scan. Ties on `sent_at` are broken by id so the order
    /// matches insertion order.
    async fn fetch_history(&self, filter: HistoryFilter) -> Result<Vec<ChatMessage>, AppError> {
        let (rows, receiver_type) = match filter {
            HistoryFilter::Direct { user_id, peer_id } => {
                let sql = format!(
                    "{} WHERE m.receiver_type = 'user'
                       AND ((m.sender_id = $1 AND m.receiver_id = $2)
                         OR (m.sender_id = $2 AND m.receiver_id = $1))
                     ORDER BY m.sent_at ASC, m.id ASC",
                    HISTORY_COLUMNS
                );
                let rows = sqlx::query_as::<_, MessageRow>(&sql)
                    .bind(user_id)
                    .bind(peer_id)
                    .fetch_all(&self.pool)
                    .await?;
                (rows, ReceiverType::User)
            }
            HistoryFilter::Group { group_id } => {
                let sql = format!(
                    "{} WHERE m.receiver_type = 'group' AND m.receiver_id = $1
                     ORDER BY m.sent_at ASC, m.id ASC",
                    HISTORY_COLUMNS
                );
                let rows = sqlx::query_as::<_, MessageRow>(&sql)
                    .bind(group_id)
                    .fetch_all(&self.pool)
                    .await?;
                (rows, ReceiverType::Group)
            }
        };

        Ok(rows
            .into_iter()
            .map(|row| row.into_message(receiver_type))
            .collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
