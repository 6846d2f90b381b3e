//! Authentication Middleware
//!
//! Session validation for protected routes and the connection upgrade.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::application::services::AuthError;
use crate::presentation::http::extractors::Credential;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated user extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Authentication middleware for API routes (`Authorization: Bearer` only)
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned);

    let user = authenticate(&state, token.as_deref()).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Authentication middleware for the connection upgrade (header or `?token=`).
/// Runs before the upgrade is accepted.
pub async fn connect_auth_middleware(
    State(state): State<AppState>,
    Credential(token): Credential,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, token.as_deref()).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

async fn authenticate(state: &AppState, token: Option<&str>) -> Result<AuthUser, AppError> {
    match state.validator.authenticate(token).await {
        Ok(user_id) => Ok(AuthUser { user_id }),
        Err(e) => {
            match &e {
                AuthError::Store(reason) => {
                    tracing::error!(error = %reason, "Session store unavailable, refusing credential")
                }
                _ => tracing::debug!(error = %e, "Credential refused"),
            }
            Err(AppError::Unauthorized(e.to_string()))
        }
    }
}
