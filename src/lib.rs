//! # Chat Hub Library
//!
//! Real-time messaging core:
//! - WebSocket connections authenticated against a revocable session store
//! - In-memory hub of live connections and session-scoped group subscriptions
//! - Direct and group messages, persisted once and fanned out to every
//!   live recipient connection
//! - History and presence HTTP endpoints
//!
//! ## Architecture
//!
//! - **Domain Layer**: Entities and collaborator traits
//! - **Application Layer**: Session validation and the chat message service
//! - **Infrastructure Layer**: PostgreSQL, Redis and Prometheus
//! - **Presentation Layer**: HTTP handlers and the WebSocket hub
//!
//! ## Module Structure
//!
//! ```text
//! chat_hub/
//! +-- config/         Configuration management
//! +-- domain/         Entities and collaborator traits
//! +-- application/    Services and DTOs
//! +-- infrastructure/ Database, session store and metrics
//! +-- presentation/   HTTP routes, middleware and WebSocket gateway
//! +-- shared/         Common error type
//! ```

// Configuration module
pub mod config;

// Domain layer
pub mod domain;

// Application layer
pub mod application;

// Infrastructure layer
pub mod infrastructure;

// Presentation layer
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
