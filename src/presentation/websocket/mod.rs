//! WebSocket Gateway
//!
//! Real-time delivery over WebSocket connections.
//!
//! - [`hub`]: registry of live connections and group subscriptions
//! - [`connection`]: per-connection reader and writer pumps
//! - [`messages`]: envelope wire format
//! - [`dispatcher`]: routing of decoded envelopes

pub mod connection;
pub mod dispatcher;
pub mod handler;
pub mod hub;
pub mod messages;

pub use connection::Connection;
pub use dispatcher::{Dispatcher, DropReason, Origin, Outcome};
pub use handler::ws_handler;
pub use hub::{ConnectionId, ConnectionInfo, DeliveryReport, Frame, Hub, Registration};
pub use messages::{new_message_frame, ClientEvent, Envelope, EnvelopeKind, ProtocolError};
