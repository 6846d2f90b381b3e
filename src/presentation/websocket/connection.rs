//! Connection Pumps
//!
//! Each live connection runs two loops: a writer draining the outbound
//! queue into the socket and a reader feeding inbound frames to the
//! dispatcher. Either loop ending tears the connection down through
//! [`Hub::unregister`], which is idempotent.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::dispatcher::{Dispatcher, DropReason, Origin, Outcome};
use super::hub::{ConnectionId, Frame, Hub};
use crate::domain::UserId;

/// One registered connection, ready to run its pumps.
pub struct Connection {
    origin: Origin,
    hub: Arc<Hub>,
    dispatcher: Arc<Dispatcher>,
    write_timeout: Duration,
}

impl Connection {
    pub fn new(
        connection_id: ConnectionId,
        user_id: UserId,
        hub: Arc<Hub>,
        dispatcher: Arc<Dispatcher>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            origin: Origin {
                connection_id,
                user_id,
            },
            hub,
            dispatcher,
            write_timeout,
        }
    }

    /// Run both pumps over an upgraded socket until the connection ends.
    pub async fn run(self, socket: WebSocket, outbound: mpsc::Receiver<Frame>) {
        let (sink, stream) = socket.split();
        self.serve(sink, stream, outbound).await;
    }

    /// Transport-agnostic body of [`Connection::run`].
    pub async fn serve<S, R, E>(self, sink: S, stream: R, outbound: mpsc::Receiver<Frame>)
    where
        S: Sink<Message> + Unpin + Send + 'static,
        S::Error: Display,
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        let writer = tokio::spawn(write_pump(
            sink,
            outbound,
            self.hub.clone(),
            self.origin.connection_id,
            self.write_timeout,
        ));

        self.read_pump(stream, writer).await;
    }

    async fn read_pump<R, E>(self, mut stream: R, mut writer: JoinHandle<()>)
    where
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        let connection_id = self.origin.connection_id;

        loop {
            tokio::select! {
                inbound = stream.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let outcome = self.dispatcher.dispatch(self.origin, text.as_str()).await;
                        if outcome == Outcome::Dropped(DropReason::Unregistered) {
                            tracing::debug!(connection_id = %connection_id, "Connection dropped by hub");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %connection_id, "Peer closed connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "Read failed");
                        break;
                    }
                },
                // The writer only stops once the connection is finished.
                _ = &mut writer => break,
            }
        }

        self.hub.unregister(connection_id);
        writer.abort();

        tracing::info!(
            connection_id = %connection_id,
            user_id = self.origin.user_id,
            "Connection closed"
        );
    }
}

async fn write_pump<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<Frame>,
    hub: Arc<Hub>,
    connection_id: ConnectionId,
    write_timeout: Duration,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(frame) = outbound.recv().await {
        match timeout(write_timeout, sink.send(Message::Text(frame))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "Write failed");
                hub.unregister(connection_id);
                return;
            }
            Err(_) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    timeout_secs = write_timeout.as_secs(),
                    "Write timed out"
                );
                hub.unregister(connection_id);
                return;
            }
        }
    }

    // Queue closed: the hub dropped this connection.
    let _ = timeout(write_timeout, sink.send(Message::Close(None))).await;
}
