//! WebSocket Connection Handler
//!
//! Upgrade endpoint. The credential has already been checked by the
//! connect middleware; a refused credential never reaches this handler, so
//! nothing is registered for it.

use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
    Extension,
};

use super::connection::Connection;
use crate::presentation::http::extractors::ClientAddr;
use crate::presentation::middleware::AuthUser;
use crate::startup::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    State(state): State<AppState>,
    Extension(AuthUser { user_id }): Extension<AuthUser>,
    ClientAddr(remote_addr): ClientAddr,
    ws: WebSocketUpgrade,
) -> Response {
    let max_message_size = state.settings.websocket.max_message_size;
    let max_frame_size = state.settings.websocket.max_frame_size;

    ws.max_message_size(max_message_size)
        .max_frame_size(max_frame_size)
        .on_upgrade(move |socket| async move {
            let registration = state.hub.register(user_id, remote_addr);
            let connection = Connection::new(
                registration.connection_id,
                user_id,
                state.hub.clone(),
                state.dispatcher.clone(),
                state.settings.websocket.write_timeout(),
            );
            connection.run(socket, registration.outbound).await;
        })
}
