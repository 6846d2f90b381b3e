//! Cache Module
//!
//! Redis connection management and the revocable session store.
//!
//! # Example
//!
//! ```rust,ignore
//! use chat_hub::infrastructure::cache::{create_redis_client, RedisSessionStore};
//!
//! let conn = create_redis_client(&settings.redis).await?;
//! let sessions = RedisSessionStore::new(conn);
//! let owner = sessions.lookup(token).await?;
//! ```

mod session_cache;

pub use session_cache::RedisSessionStore;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Creates a Redis connection manager with automatic reconnection.
///
/// # Errors
/// Returns `redis::RedisError` if the URL is invalid or the first
/// connection cannot be established.
#[instrument(skip(settings), fields(url = %settings.url))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Cache key prefixes for different data types.
pub mod keys {
    /// Prefix for live login sessions (e.g., "token:<raw bearer token>")
    pub const SESSION_TOKEN: &str = "token:";

    /// Generates the session key for a raw token
    #[inline]
    pub fn session_token(token: &str) -> String {
        format!("{}{}", SESSION_TOKEN, token)
    }
}
