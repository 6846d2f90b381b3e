//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{
    auth_middleware, connect_auth_middleware, create_cors_layer, track_http_metrics,
};
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    let cors = create_cors_layer(&state.settings.cors);

    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // Connection upgrade; the credential is checked before upgrading
        .route(
            "/ws/connect",
            get(ws_handler).route_layer(middleware::from_fn_with_state(
                state.clone(),
                connect_auth_middleware,
            )),
        )
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_http_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes (protected)
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/messages/history/{receiver_type}/{receiver_id}",
            get(handlers::history::get_history),
        )
        .route("/presence/online", get(handlers::presence::online_users))
        .route(
            "/presence/users/{user_id}/connections",
            get(handlers::presence::user_connections),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
