//! Session Validation Service
//!
//! Resolves a bearer credential to a user id. A credential is accepted only
//! when its JWT signature and expiry verify AND the raw token still maps to
//! a live entry in the revocable session store.

use std::sync::Arc;

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::JwtSettings;
use crate::domain::{SessionStore, UserId};

/// JWT claims structure
///
/// Only `exp` is required. The account service issues
/// `{user_id, username, is_admin, exp}`; other claims are ignored.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID), a number or a numeric string
    #[serde(default, alias = "user_id", skip_serializing_if = "Option::is_none")]
    pub sub: Option<Value>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl Claims {
    /// The subject as a user id, if it is numeric.
    pub fn subject_id(&self) -> Option<UserId> {
        match self.sub.as_ref()? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Session not found or expired")]
    SessionNotFound,

    #[error("Session store error: {0}")]
    Store(String),
}

/// Verifies bearer credentials against the signing key and the session store.
///
/// Read-only: validation never creates, extends, or revokes a session.
pub struct SessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    store: Arc<dyn SessionStore>,
}

impl SessionValidator {
    /// Create a validator for tokens signed with the configured secret.
    pub fn new(jwt_settings: &JwtSettings, store: Arc<dyn SessionStore>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_settings.secret.as_bytes()),
            validation: Validation::default(),
            store,
        }
    }

    /// Resolve a credential to the user owning its session.
    pub async fn authenticate(&self, credential: Option<&str>) -> Result<UserId, AuthError> {
        let token = credential
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.decode_token(token)?;

        let user_id = self
            .store
            .lookup(token)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?
            .ok_or(AuthError::SessionNotFound)?;

        // A numeric subject must agree with the session owner.
        if let Some(subject) = claims.subject_id() {
            if subject != user_id {
                return Err(AuthError::InvalidToken);
            }
        }

        Ok(user_id)
    }

    /// Check that the session store is reachable.
    pub async fn ping_store(&self) -> Result<(), String> {
        self.store.ping().await.map_err(|e| e.to_string())
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}
