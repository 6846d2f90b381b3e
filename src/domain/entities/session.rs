//! Revocable login sessions.
//!
//! A signed token alone cannot express "logged out" or "revoked", so every
//! token must also map to a live entry in the session store.

use async_trait::async_trait;

use crate::shared::error::AppError;

use super::UserId;

/// Key-value store mapping raw bearer tokens to their owner.
///
/// Entries expire together with the credential they were issued for.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Owner of a live session, or `None` when the token is unknown or expired.
    async fn lookup(&self, token: &str) -> Result<Option<UserId>, AppError>;

    /// Connectivity check used by the readiness probe.
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
