//! Message History Handler

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::application::services::MessageError;
use crate::domain::{ChatMessage, ReceiverType};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// History response body
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub receiver_type: ReceiverType,
    pub receiver_id: i64,
    pub messages: Vec<ChatMessage>,
    pub count: usize,
}

/// GET /api/v1/messages/history/{receiver_type}/{receiver_id}
///
/// Messages in ascending send order. For `user` this is the caller's
/// conversation with `receiver_id`; for `group` the caller must be a member.
pub async fn get_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((receiver_type, receiver_id)): Path<(String, i64)>,
) -> Result<Json<HistoryResponse>, AppError> {
    let receiver_type = ReceiverType::parse(&receiver_type).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown receiver type: {}", receiver_type))
    })?;

    let messages = state
        .chat
        .history(auth.user_id, receiver_type, receiver_id)
        .await
        .map_err(|e| match e {
            MessageError::NotGroupMember(_) | MessageError::NotParticipant => {
                AppError::Forbidden(e.to_string())
            }
            MessageError::Invalid(msg) => AppError::BadRequest(msg),
            MessageError::Persistence(msg) | MessageError::Store(msg) => {
                tracing::error!(error = %msg, "History lookup failed");
                AppError::Internal("Failed to load history".into())
            }
        })?;

    Ok(Json(HistoryResponse {
        receiver_type,
        receiver_id,
        count: messages.len(),
        messages,
    }))
}
