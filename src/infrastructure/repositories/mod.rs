//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! ## Available Repositories
//!
//! - **PgMessageRepository** - Append-only message store and history scans
//! - **PgGroupMemberRepository** - Durable group membership checks
//! - **PgUserRepository** - Sender display names
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::infrastructure::repositories::{
//!     PgGroupMemberRepository, PgMessageRepository, PgUserRepository,
//! };
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let messages = PgMessageRepository::new(pool.clone());
//!     let members = PgGroupMemberRepository::new(pool.clone());
//!     let users = PgUserRepository::new(pool);
//! }
//! ```

pub mod member_repository;
pub mod message_repository;
pub mod user_repository;

pub use member_repository::PgGroupMemberRepository;
pub use message_repository::PgMessageRepository;
pub use user_repository::PgUserRepository;
