//! # Domain Layer
//!
//! Core types of the messaging core, independent of transport and storage.
//!
//! ## Structure
//!
//! - **entities**: Chat messages and the collaborator traits (message store,
//!   membership, user directory, session store)
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts

pub mod entities;

// Re-export commonly used types
pub use entities::*;
