//! Session Cache Service
//!
//! Redis-backed revocable session store. The account service writes
//! `token:<raw token>` → user id with an expiry matching the token lifetime;
//! logout deletes the key. This side only reads.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::keys;
use crate::domain::{SessionStore, UserId};
use crate::shared::error::AppError;

/// Session store backed by Redis string keys.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
}

impl RedisSessionStore {
    /// Create a new session store
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn lookup(&self, token: &str) -> Result<Option<UserId>, AppError> {
        let key = keys::session_token(token);

        let mut conn = self.redis.clone();
        let value: Option<String> = conn.get(&key).await?;

        match value {
            Some(raw) => parse_user_id(&raw).map(Some),
            None => Ok(None),
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.redis.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

/// Session values are decimal user ids.
fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    raw.trim()
        .parse::<UserId>()
        .map_err(|_| AppError::Internal(format!("Malformed session value: {:?}", raw)))
}
