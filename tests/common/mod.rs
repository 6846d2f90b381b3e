//! Common Test Utilities
//!
//! In-memory collaborators, token minting and a router wired to them.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::mpsc;
use tower::ServiceExt;

use chat_hub::application::services::{ChatService, SessionValidator};
use chat_hub::config::{
    CorsSettings, DatabaseSettings, JwtSettings, RedisSettings, ServerSettings, Settings,
    WebSocketSettings,
};
use chat_hub::domain::{
    ChatMessage, GroupId, GroupMembership, HistoryFilter, MessageRepository, NewChatMessage,
    PersistedMessage, ReceiverType, SessionStore, UserDirectory, UserId, UserProfile,
};
use chat_hub::presentation::http::create_router;
use chat_hub::presentation::websocket::{Frame, Origin, Outcome};
use chat_hub::shared::error::AppError;
use chat_hub::startup::AppState;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Sign a token for `user_id` valid for one hour, shaped like the ones
/// the account service issues.
pub fn mint_token(user_id: UserId, secret: &str) -> String {
    let claims = json!({
        "user_id": user_id,
        "username": format!("user{}", user_id),
        "is_admin": false,
        "exp": Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseSettings {
            url: "postgres://unused".into(),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout: 1,
        },
        redis: RedisSettings {
            url: "redis://unused".into(),
        },
        jwt: JwtSettings {
            secret: TEST_SECRET.into(),
        },
        cors: CorsSettings {
            allowed_origins: Vec::new(),
        },
        websocket: WebSocketSettings::default(),
        environment: "test".into(),
    }
}

/// Sessions, memberships, names and messages held in memory.
#[derive(Default)]
pub struct FakeBackend {
    sessions: Mutex<HashMap<String, UserId>>,
    members: Mutex<HashSet<(GroupId, UserId)>>,
    names: Mutex<HashMap<UserId, String>>,
    messages: Mutex<Vec<ChatMessage>>,
    pub fail_persist: AtomicBool,
}

impl FakeBackend {
    /// Open a session for `user_id` and return its token.
    pub fn login(&self, user_id: UserId) -> String {
        let token = mint_token(user_id, TEST_SECRET);
        self.sessions.lock().insert(token.clone(), user_id);
        token
    }

    pub fn logout(&self, token: &str) {
        self.sessions.lock().remove(token);
    }

    pub fn add_member(&self, group_id: GroupId, user_id: UserId) {
        self.members.lock().insert((group_id, user_id));
    }

    pub fn set_name(&self, user_id: UserId, name: &str) {
        self.names.lock().insert(user_id, name.to_owned());
    }

    pub fn stored(&self) -> Vec<ChatMessage> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl SessionStore for FakeBackend {
    async fn lookup(&self, token: &str) -> Result<Option<UserId>, AppError> {
        Ok(self.sessions.lock().get(token).copied())
    }
}

#[async_trait]
impl GroupMembership for FakeBackend {
    async fn is_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<bool, AppError> {
        Ok(self.members.lock().contains(&(group_id, user_id)))
    }
}

#[async_trait]
impl UserDirectory for FakeBackend {
    async fn display_name(&self, user_id: UserId) -> Result<Option<String>, AppError> {
        Ok(self.names.lock().get(&user_id).cloned())
    }

    /// Only users given a name with [`FakeBackend::set_name`] exist.
    async fn profiles(&self, user_ids: &[UserId]) -> Result<Vec<UserProfile>, AppError> {
        let names = self.names.lock();
        let mut profiles: Vec<UserProfile> = user_ids
            .iter()
            .filter_map(|id| {
                names.get(id).map(|name| UserProfile {
                    id: *id,
                    username: format!("user{}", id),
                    nickname: Some(name.clone()),
                    avatar_url: None,
                })
            })
            .collect();
        profiles.sort_by_key(|p| p.id);
        Ok(profiles)
    }
}

#[async_trait]
impl MessageRepository for FakeBackend {
    async fn persist(&self, message: &NewChatMessage) -> Result<PersistedMessage, AppError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(AppError::Internal("insert failed".into()));
        }

        let sender_name = self
            .names
            .lock()
            .get(&message.sender_id)
            .cloned()
            .unwrap_or_default();

        let mut messages = self.messages.lock();
        let stored = PersistedMessage {
            id: messages.len() as i64 + 1,
            sent_at: Utc::now(),
        };
        messages.push(ChatMessage::from_persisted(
            message.clone(),
            stored,
            sender_name,
        ));
        Ok(stored)
    }

    async fn fetch_history(&self, filter: HistoryFilter) -> Result<Vec<ChatMessage>, AppError> {
        let mut history: Vec<ChatMessage> = self
            .messages
            .lock()
            .iter()
            .filter(|m| match filter {
                HistoryFilter::Direct { user_id, peer_id } => {
                    m.receiver_type == ReceiverType::User
                        && ((m.sender_id == user_id && m.receiver_id == peer_id)
                            || (m.sender_id == peer_id && m.receiver_id == user_id))
                }
                HistoryFilter::Group { group_id } => {
                    m.receiver_type == ReceiverType::Group && m.receiver_id == group_id
                }
            })
            .cloned()
            .collect();
        history.sort_by_key(|m| (m.sent_at, m.message_id));
        Ok(history)
    }
}

/// Router and state wired to a [`FakeBackend`].
pub struct TestApp {
    pub backend: Arc<FakeBackend>,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let backend = Arc::new(FakeBackend::default());
        let settings = test_settings();

        let validator = SessionValidator::new(&settings.jwt, backend.clone());
        let chat = ChatService::new(backend.clone(), backend.clone(), backend.clone());
        let state = AppState::new(settings, validator, chat);
        let router = create_router(state.clone());

        Self {
            backend,
            state,
            router,
        }
    }

    /// Register a live connection for `user_id` directly with the hub.
    pub fn connect(&self, user_id: UserId) -> (Origin, mpsc::Receiver<Frame>) {
        let registration = self.state.hub.register(user_id, None);
        (
            Origin {
                connection_id: registration.connection_id,
                user_id,
            },
            registration.outbound,
        )
    }

    /// Feed one client frame through the dispatcher.
    pub async fn send(&self, origin: Origin, frame: serde_json::Value) -> Outcome {
        self.state
            .dispatcher
            .dispatch(origin, &frame.to_string())
            .await
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> Response {
        self.router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// Make an authenticated GET request
    pub async fn get_auth(&self, uri: &str, token: &str) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

/// Read a response body as JSON.
pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Drain every frame currently queued for a connection.
pub fn drain(outbound: &mut mpsc::Receiver<Frame>) -> Vec<serde_json::Value> {
    let mut frames = Vec::new();
    while let Ok(frame) = outbound.try_recv() {
        frames.push(serde_json::from_str(frame.as_str()).unwrap());
    }
    frames
}
