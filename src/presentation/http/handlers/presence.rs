//! Presence Handlers
//!
//! Read-only views of the connection hub.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::domain::{UserId, UserProfile};
use crate::presentation::websocket::ConnectionInfo;
use crate::shared::error::AppError;
use crate::startup::AppState;

#[derive(Debug, Serialize)]
pub struct OnlineUsersResponse {
    pub online_users: Vec<UserId>,
    /// Profiles of the online users that exist in the user store
    pub users: Vec<UserProfile>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct UserConnectionsResponse {
    pub user_id: UserId,
    pub connections: Vec<ConnectionInfo>,
    pub count: usize,
}

/// GET /api/v1/presence/online
pub async fn online_users(
    State(state): State<AppState>,
) -> Result<Json<OnlineUsersResponse>, AppError> {
    let online_users = state.hub.online_users();
    let users = state
        .chat
        .profiles(&online_users)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(OnlineUsersResponse {
        count: online_users.len(),
        online_users,
        users,
    }))
}

/// GET /api/v1/presence/users/{user_id}/connections
pub async fn user_connections(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Json<UserConnectionsResponse> {
    let connections = state.hub.user_connections(user_id);
    Json(UserConnectionsResponse {
        user_id,
        count: connections.len(),
        connections,
    })
}
