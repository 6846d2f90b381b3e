//! Connection Hub
//!
//! The single in-memory registry of live connections and their
//! session-scoped group subscriptions.
//!
//! All state sits behind one `RwLock`. Every mutation and every fan-out
//! holds the write lock for its whole duration, so a connection is either
//! fully registered (and a valid fan-out target) or fully gone from every
//! index. Fan-out never awaits: frames are offered with `try_send` and a
//! recipient whose outbound queue is full or closed is evicted on the spot.
//! Slow consumers are disconnected rather than buffered without bound.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::net::SocketAddr;

use axum::extract::ws::Utf8Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::{GroupId, UserId};
use crate::infrastructure::metrics;

/// An encoded, ready-to-write text frame. Cloning is cheap.
pub type Frame = Utf8Bytes;

/// Opaque handle of one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Diagnostic view of a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub remote_addr: Option<String>,
    pub connected_at: DateTime<Utc>,
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Frames accepted into an outbound queue.
    pub delivered: usize,
    /// Recipients dropped because their queue was full or closed.
    pub evicted: usize,
}

/// Returned by [`Hub::register`]: the new handle and the receiving end of
/// its outbound queue, to be drained by the connection's writer.
#[derive(Debug)]
pub struct Registration {
    pub connection_id: ConnectionId,
    pub outbound: mpsc::Receiver<Frame>,
}

struct ConnectedClient {
    user_id: UserId,
    remote_addr: Option<SocketAddr>,
    connected_at: DateTime<Utc>,
    /// The only sender of this connection's queue.
    sender: mpsc::Sender<Frame>,
    groups: HashSet<GroupId>,
}

impl ConnectedClient {
    fn info(&self, connection_id: ConnectionId) -> ConnectionInfo {
        ConnectionInfo {
            connection_id,
            user_id: self.user_id,
            remote_addr: self.remote_addr.map(|addr| addr.to_string()),
            connected_at: self.connected_at,
        }
    }
}

#[derive(Default)]
struct HubState {
    connections: HashMap<ConnectionId, ConnectedClient>,
    groups: HashMap<GroupId, HashSet<ConnectionId>>,
    users: HashMap<UserId, HashSet<ConnectionId>>,
}

impl HubState {
    /// Drop a connection from every index. Dropping the client drops its
    /// queue sender, which closes the queue.
    fn remove(&mut self, id: ConnectionId) -> Option<ConnectedClient> {
        let client = self.connections.remove(&id)?;

        for group_id in &client.groups {
            if let Some(members) = self.groups.get_mut(group_id) {
                members.remove(&id);
                if members.is_empty() {
                    self.groups.remove(group_id);
                }
            }
        }

        if let Some(owned) = self.users.get_mut(&client.user_id) {
            owned.remove(&id);
            if owned.is_empty() {
                self.users.remove(&client.user_id);
            }
        }

        Some(client)
    }

    fn deliver<I>(&mut self, targets: I, frame: &Frame) -> DeliveryReport
    where
        I: IntoIterator<Item = ConnectionId>,
    {
        let mut report = DeliveryReport::default();
        let mut slow = Vec::new();

        for id in targets {
            let Some(client) = self.connections.get(&id) else {
                continue;
            };
            match client.sender.try_send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(_) => slow.push(id),
            }
        }

        for id in slow {
            if let Some(client) = self.remove(id) {
                tracing::warn!(
                    connection_id = %id,
                    user_id = client.user_id,
                    "Outbound queue full or closed, evicting connection"
                );
                report.evicted += 1;
            }
        }

        report
    }

    fn publish_gauges(&self) {
        metrics::set_hub_gauges(self.connections.len(), self.groups.len());
    }
}

/// Registry of live connections and group subscriptions.
pub struct Hub {
    state: RwLock<HubState>,
    queue_capacity: usize,
}

impl Hub {
    /// Create an empty hub whose connections get outbound queues of
    /// `queue_capacity` frames.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            state: RwLock::new(HubState::default()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Add a connection for `user_id`. It is a valid fan-out target as soon
    /// as this returns.
    pub fn register(&self, user_id: UserId, remote_addr: Option<SocketAddr>) -> Registration {
        let connection_id = ConnectionId::generate();
        let (sender, outbound) = mpsc::channel(self.queue_capacity);

        let mut state = self.state.write();
        state.connections.insert(
            connection_id,
            ConnectedClient {
                user_id,
                remote_addr,
                connected_at: Utc::now(),
                sender,
                groups: HashSet::new(),
            },
        );
        state
            .users
            .entry(user_id)
            .or_default()
            .insert(connection_id);
        state.publish_gauges();
        drop(state);

        tracing::info!(
            connection_id = %connection_id,
            user_id = user_id,
            "Connection registered"
        );

        Registration {
            connection_id,
            outbound,
        }
    }

    /// Remove a connection from the registry and from every group, closing
    /// its outbound queue. Returns `false` if it was already gone.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let mut state = self.state.write();
        let removed = state.remove(id);
        state.publish_gauges();
        drop(state);

        match removed {
            Some(client) => {
                tracing::info!(
                    connection_id = %id,
                    user_id = client.user_id,
                    groups = client.groups.len(),
                    "Connection unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Subscribe a live connection to a group. Returns `false` if the
    /// connection is not registered.
    pub fn join_group(&self, group_id: GroupId, id: ConnectionId) -> bool {
        let mut state = self.state.write();
        let Some(client) = state.connections.get_mut(&id) else {
            return false;
        };
        client.groups.insert(group_id);
        state.groups.entry(group_id).or_default().insert(id);
        state.publish_gauges();

        tracing::debug!(connection_id = %id, group_id = group_id, "Joined group");
        true
    }

    /// Unsubscribe a connection from a group, dropping the group entry once
    /// it is empty.
    pub fn leave_group(&self, group_id: GroupId, id: ConnectionId) {
        let mut state = self.state.write();
        if let Some(client) = state.connections.get_mut(&id) {
            client.groups.remove(&group_id);
        }
        if let Some(members) = state.groups.get_mut(&group_id) {
            members.remove(&id);
            if members.is_empty() {
                state.groups.remove(&group_id);
            }
        }
        state.publish_gauges();

        tracing::debug!(connection_id = %id, group_id = group_id, "Left group");
    }

    /// Offer `frame` to every connection subscribed to `group_id`.
    pub fn send_to_group(&self, group_id: GroupId, frame: &Frame) -> DeliveryReport {
        let mut state = self.state.write();
        let targets: Vec<ConnectionId> = match state.groups.get(&group_id) {
            Some(members) => members.iter().copied().collect(),
            None => return DeliveryReport::default(),
        };
        let report = state.deliver(targets, frame);
        state.publish_gauges();
        drop(state);

        metrics::record_fan_out(report.delivered, report.evicted);
        report
    }

    /// Offer `frame` to every live connection.
    pub fn broadcast_all(&self, frame: &Frame) -> DeliveryReport {
        let mut state = self.state.write();
        let targets: Vec<ConnectionId> = state.connections.keys().copied().collect();
        let report = state.deliver(targets, frame);
        state.publish_gauges();
        drop(state);

        metrics::record_fan_out(report.delivered, report.evicted);
        report
    }

    /// Offer `frame` to every live connection of each listed user. A user
    /// listed twice still receives the frame once per connection.
    pub fn send_to_users(&self, user_ids: &[UserId], frame: &Frame) -> DeliveryReport {
        let mut state = self.state.write();
        let targets: HashSet<ConnectionId> = user_ids
            .iter()
            .filter_map(|user_id| state.users.get(user_id))
            .flat_map(|owned| owned.iter().copied())
            .collect();
        let report = state.deliver(targets, frame);
        state.publish_gauges();
        drop(state);

        metrics::record_fan_out(report.delivered, report.evicted);
        report
    }

    /// Close every live connection. Used on shutdown.
    pub fn disconnect_all(&self) -> usize {
        let mut state = self.state.write();
        let closed = state.connections.len();
        state.connections.clear();
        state.groups.clear();
        state.users.clear();
        state.publish_gauges();
        drop(state);

        if closed > 0 {
            tracing::info!(connections = closed, "Disconnected all connections");
        }
        closed
    }

    /// Users with at least one live connection, ascending.
    pub fn online_users(&self) -> Vec<UserId> {
        let state = self.state.read();
        let mut users: Vec<UserId> = state.users.keys().copied().collect();
        users.sort_unstable();
        users
    }

    /// Live connections of one user, oldest first.
    pub fn user_connections(&self, user_id: UserId) -> Vec<ConnectionInfo> {
        let state = self.state.read();
        let mut infos: Vec<ConnectionInfo> = state
            .users
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|id| state.connections.get(id).map(|client| client.info(*id)))
            .collect();
        infos.sort_by(|a, b| {
            a.connected_at
                .cmp(&b.connected_at)
                .then(a.connection_id.cmp(&b.connection_id))
        });
        infos
    }

    pub fn is_registered(&self, id: ConnectionId) -> bool {
        self.state.read().connections.contains_key(&id)
    }

    pub fn connection_count(&self) -> usize {
        self.state.read().connections.len()
    }

    /// Number of non-empty groups.
    pub fn group_count(&self) -> usize {
        self.state.read().groups.len()
    }

    /// Connections currently subscribed to a group.
    pub fn group_members(&self, group_id: GroupId) -> Vec<ConnectionId> {
        let state = self.state.read();
        let mut members: Vec<ConnectionId> = state
            .groups
            .get(&group_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default();
        members.sort_unstable();
        members
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(256)
    }
}
