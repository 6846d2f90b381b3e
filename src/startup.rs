//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;

use crate::application::services::{ChatService, SessionValidator};
use crate::config::Settings;
use crate::infrastructure::cache::{self, RedisSessionStore};
use crate::infrastructure::database;
use crate::infrastructure::repositories::{
    PgGroupMemberRepository, PgMessageRepository, PgUserRepository,
};
use crate::presentation::http::{handlers::health, routes};
use crate::presentation::websocket::{Dispatcher, Hub};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
    pub dispatcher: Arc<Dispatcher>,
    pub chat: Arc<ChatService>,
    pub validator: Arc<SessionValidator>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire a fresh hub to the given services.
    pub fn new(settings: Settings, validator: SessionValidator, chat: ChatService) -> Self {
        let hub = Arc::new(Hub::new(settings.websocket.outbound_queue_capacity));
        let chat = Arc::new(chat);
        let dispatcher = Arc::new(Dispatcher::new(hub.clone(), chat.clone()));

        Self {
            hub,
            dispatcher,
            chat,
            validator: Arc::new(validator),
            settings: Arc::new(settings),
        }
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    hub: Arc<Hub>,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        // Create database pool
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        // Create Redis client
        let redis = cache::create_redis_client(&settings.redis).await?;

        let validator = SessionValidator::new(
            &settings.jwt,
            Arc::new(RedisSessionStore::new(redis)),
        );
        let chat = ChatService::new(
            Arc::new(PgMessageRepository::new(db.clone())),
            Arc::new(PgGroupMemberRepository::new(db.clone())),
            Arc::new(PgUserRepository::new(db)),
        );

        let addr = settings.server_addr();
        let state = AppState::new(settings, validator, chat);
        let hub = state.hub.clone();
        let router = routes::create_router(state);

        // Bind to address
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router,
            hub,
        })
    }

    /// Run the server until a shutdown signal arrives. Live connections are
    /// closed first so in-flight upgrades do not hold the server open.
    pub async fn run_until_stopped(self) -> Result<()> {
        let hub = self.hub;

        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let closed = hub.disconnect_all();
            tracing::info!(connections = closed, "Shutdown signal received");
        })
        .await?;

        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
