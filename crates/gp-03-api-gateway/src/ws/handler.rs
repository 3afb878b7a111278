//! WebSocket connection handler.
//!
//! Registers the connection with the [`Hub`], reads frames until the client
//! goes away, then deregisters. Each recognised action is dispatched to its
//! own task, so the read loop never waits on the repository.

use crate::domain::config::WebSocketConfig;
use crate::ws::hub::{Connection, Hub};
use axum::extract::ws::{Message, WebSocket};
use futures::{Stream, StreamExt};
use shared_types::{GroupId, SecurityPile};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// WebSocket connection handler
pub struct WebSocketHandler {
    hub: Arc<Hub>,
    config: WebSocketConfig,
}

impl WebSocketHandler {
    pub fn new(hub: Arc<Hub>, config: WebSocketConfig) -> Self {
        Self { hub, config }
    }

    /// Handle an upgraded socket for an already authorized member.
    pub async fn handle(self, socket: WebSocket, group_id: GroupId, pile: SecurityPile) {
        let (sink, stream) = socket.split();
        let connection = self.hub.register(group_id, pile, Box::new(sink));

        info!(
            connection_id = %connection.id(),
            group_id = %connection.group_id(),
            "New WebSocket connection"
        );

        self.read_loop(&connection, stream).await;

        self.hub.deregister(&connection);
        info!(
            connection_id = %connection.id(),
            group_id = %connection.group_id(),
            "WebSocket connection closed"
        );
    }

    /// Check message size, returns true if the frame must be dropped
    fn exceeds_size_limit(&self, connection: &Connection, size: usize) -> bool {
        if size > self.config.max_message_size {
            warn!(
                connection_id = %connection.id(),
                size = size,
                max = self.config.max_message_size,
                "Message exceeds size limit"
            );
            true
        } else {
            false
        }
    }

    /// Consume inbound frames until close or error.
    pub async fn read_loop<St, E>(&self, connection: &Arc<Connection>, mut stream: St)
    where
        St: Stream<Item = Result<Message, E>> + Unpin,
        E: std::fmt::Display,
    {
        while let Some(result) = stream.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if self.exceeds_size_limit(connection, text.len()) {
                        continue;
                    }
                    self.hub.dispatch(connection, &text);
                }
                Ok(Message::Binary(data)) => {
                    if self.exceeds_size_limit(connection, data.len()) {
                        continue;
                    }
                    match String::from_utf8(data) {
                        Ok(text) => {
                            self.hub.dispatch(connection, &text);
                        }
                        Err(_) => {
                            debug!(connection_id = %connection.id(), "Ignoring non-UTF-8 binary frame");
                        }
                    }
                }
                Ok(Message::Ping(data)) => {
                    if let Err(e) = connection.send_pong(data).await {
                        warn!(connection_id = %connection.id(), error = %e, "Failed to send pong");
                        break;
                    }
                }
                Ok(Message::Pong(_)) => {
                    // Ignore pongs
                }
                Ok(Message::Close(_)) => {
                    debug!(connection_id = %connection.id(), "WebSocket close received");
                    break;
                }
                Err(e) => {
                    warn!(connection_id = %connection.id(), error = %e, "WebSocket error");
                    break;
                }
            }
        }
    }
}
