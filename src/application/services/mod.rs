//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **SessionValidator**: Bearer token + revocable session authentication
//! - **ChatService**: Message authorization, persistence and history

pub mod auth_service;
pub mod message_service;

// Re-export auth service types
pub use auth_service::{AuthError, Claims, SessionValidator};

// Re-export message service types
pub use message_service::{ChatService, MessageError};
