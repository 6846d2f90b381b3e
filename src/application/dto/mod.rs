//! Data Transfer Objects
//!
//! DTOs for client payload deserialization.

pub mod request;

pub use request::{SendMessageRequest, MAX_CONTENT_LENGTH};
