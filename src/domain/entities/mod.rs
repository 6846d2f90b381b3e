//! # Domain Entities
//!
//! The data the messaging core works with and the contracts of the
//! collaborators it depends on.
//!
//! ## Entities
//!
//! - **ChatMessage**: A persisted direct or group message
//! - **NewChatMessage**: An authorized message waiting to be stored
//! - **UserProfile**: Public profile shown in presence listings
//!
//! ## Collaborator Traits
//!
//! - **MessageRepository**: Durable append and time-ordered history scan
//! - **GroupMembership**: Durable group membership check
//! - **UserDirectory**: Sender display names and profiles
//! - **SessionStore**: Revocable token → user sessions
//!
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod member;
mod message;
mod session;
mod user;

/// User identifier (the `users.id` primary key)
pub type UserId = i64;

/// Group identifier (the `groups.id` primary key)
pub type GroupId = i64;

pub use member::GroupMembership;
pub use message::{
    ChatMessage, HistoryFilter, MessageRepository, MessageType, NewChatMessage, PersistedMessage,
    ReceiverType,
};
pub use session::SessionStore;
pub use user::{UserDirectory, UserProfile};

#[cfg(test)]
pub use member::MockGroupMembership;
#[cfg(test)]
pub use message::MockMessageRepository;
#[cfg(test)]
pub use session::MockSessionStore;
#[cfg(test)]
pub use user::MockUserDirectory;
