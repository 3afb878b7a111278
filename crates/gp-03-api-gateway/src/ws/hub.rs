//! Per-group connection registry and action dispatch.
//!
//! Lock discipline:
//! - the registry mutex is held only to append, remove or snapshot;
//! - each connection's write lock serializes frames to that one socket;
//! - the two are never held together, and neither across a repository call.

use crate::domain::error::GatewayError;
use crate::ws::frames::{parse_action, Action, FrameError, OutboundFrame};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::future::join_all;
use futures::stream::SplitSink;
use futures::SinkExt;
use gp_01_group_repository::domain::is_member;
use gp_01_group_repository::{GroupRepositoryApi, RepositoryError};
use parking_lot::Mutex;
use shared_types::{CoordsBit, Group, GroupId, SecurityPile};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Write half of a client connection.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, text: String) -> Result<(), GatewayError>;

    async fn send_pong(&mut self, _payload: Vec<u8>) -> Result<(), GatewayError> {
        Ok(())
    }

    /// Start the closing handshake. The reading side ends once the peer answers.
    async fn close(&mut self) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[async_trait]
impl FrameSink for SplitSink<WebSocket, Message> {
    async fn send_text(&mut self, text: String) -> Result<(), GatewayError> {
        self.send(Message::Text(text))
            .await
            .map_err(|e| GatewayError::Send(e.to_string()))
    }

    async fn send_pong(&mut self, payload: Vec<u8>) -> Result<(), GatewayError> {
        self.send(Message::Pong(payload))
            .await
            .map_err(|e| GatewayError::Send(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), GatewayError> {
        SinkExt::close(self)
            .await
            .map_err(|e| GatewayError::Send(e.to_string()))
    }
}

/// In-process sink, used by embedders and tests.
#[async_trait]
impl FrameSink for mpsc::UnboundedSender<String> {
    async fn send_text(&mut self, text: String) -> Result<(), GatewayError> {
        mpsc::UnboundedSender::send(self, text).map_err(|e| GatewayError::Send(e.to_string()))
    }
}

/// One registered client connection.
pub struct Connection {
    id: Uuid,
    group_id: GroupId,
    pile: SecurityPile,
    sink: tokio::sync::Mutex<Box<dyn FrameSink>>,
}

impl Connection {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn pile(&self) -> &SecurityPile {
        &self.pile
    }

    pub async fn send_text(&self, text: String) -> Result<(), GatewayError> {
        self.sink.lock().await.send_text(text).await
    }

    pub async fn send_frame(&self, frame: &OutboundFrame) -> Result<(), GatewayError> {
        let text =
            serde_json::to_string(frame).map_err(|e| GatewayError::Internal(e.to_string()))?;
        self.send_text(text).await
    }

    pub async fn send_pong(&self, payload: Vec<u8>) -> Result<(), GatewayError> {
        self.sink.lock().await.send_pong(payload).await
    }

    pub async fn close(&self) -> Result<(), GatewayError> {
        self.sink.lock().await.close().await
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("group_id", &self.group_id)
            .finish_non_exhaustive()
    }
}

/// Connection hub
pub struct Hub {
    repository: Arc<dyn GroupRepositoryApi>,
    registry: Mutex<HashMap<GroupId, Vec<Arc<Connection>>>>,
}

impl Hub {
    pub fn new(repository: Arc<dyn GroupRepositoryApi>) -> Self {
        Self {
            repository,
            registry: Mutex::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &Arc<dyn GroupRepositoryApi> {
        &self.repository
    }

    /// Add a connection to its group's list.
    pub fn register(
        &self,
        group_id: GroupId,
        pile: SecurityPile,
        sink: Box<dyn FrameSink>,
    ) -> Arc<Connection> {
        let connection = Arc::new(Connection {
            id: Uuid::new_v4(),
            group_id,
            pile,
            sink: tokio::sync::Mutex::new(sink),
        });

        let mut registry = self.registry.lock();
        let connections = registry.entry(connection.group_id.clone()).or_default();
        connections.push(Arc::clone(&connection));

        debug!(
            connection_id = %connection.id,
            group_id = %connection.group_id,
            group_connections = connections.len(),
            "Registered connection"
        );
        connection
    }

    /// Remove exactly this connection. Returns false if it was not registered.
    pub fn deregister(&self, connection: &Connection) -> bool {
        let mut registry = self.registry.lock();
        let Some(connections) = registry.get_mut(&connection.group_id) else {
            return false;
        };

        let before = connections.len();
        connections.retain(|c| c.id != connection.id);
        let removed = connections.len() < before;

        if connections.is_empty() {
            registry.remove(&connection.group_id);
        }

        if removed {
            debug!(
                connection_id = %connection.id,
                group_id = %connection.group_id,
                "Deregistered connection"
            );
        }
        removed
    }

    /// Snapshot of a group's connections.
    pub fn connections(&self, group_id: &str) -> Vec<Arc<Connection>> {
        self.registry
            .lock()
            .get(group_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn connection_count(&self, group_id: &str) -> usize {
        self.registry.lock().get(group_id).map_or(0, Vec::len)
    }

    pub fn group_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Send a frame to every connection of the group. Returns the number of
    /// connections that accepted it.
    pub async fn broadcast(&self, group_id: &str, frame: &OutboundFrame) -> usize {
        let text = match serde_json::to_string(frame) {
            Ok(text) => text,
            Err(e) => {
                error!(group_id = %group_id, error = %e, "Failed to encode frame");
                return 0;
            }
        };

        let connections = self.connections(group_id);
        let results = join_all(
            connections
                .iter()
                .map(|connection| connection.send_text(text.clone())),
        )
        .await;

        let mut delivered = 0;
        for (connection, result) in connections.iter().zip(results) {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => debug!(
                    connection_id = %connection.id,
                    error = %e,
                    "Dropped broadcast to closed connection"
                ),
            }
        }
        delivered
    }

    /// Drop and close every connection of `group` whose pile no longer
    /// matches a member. Returns the number evicted.
    pub async fn evict_non_members(&self, group: &Group) -> usize {
        let evicted: Vec<Arc<Connection>> = {
            let mut registry = self.registry.lock();
            let Some(connections) = registry.get_mut(&group.id) else {
                return 0;
            };
            let (kept, evicted): (Vec<_>, Vec<_>) = connections
                .drain(..)
                .partition(|c| is_member(group, &c.pile));
            *connections = kept;
            if connections.is_empty() {
                registry.remove(&group.id);
            }
            evicted
        };

        for connection in &evicted {
            info!(
                connection_id = %connection.id,
                group_id = %group.id,
                "Evicted connection of removed member"
            );
            if let Err(e) = connection.close().await {
                debug!(connection_id = %connection.id, error = %e, "Failed to close evicted connection");
            }
        }
        evicted.len()
    }

    async fn reply(&self, connection: &Connection, frame: &OutboundFrame) {
        if let Err(e) = connection.send_frame(frame).await {
            debug!(connection_id = %connection.id, error = %e, "Dropped reply to closed connection");
        }
    }

    /// Parse an inbound frame and run the action on its own task.
    ///
    /// Frames that do not parse are logged and ignored.
    pub fn dispatch(
        self: &Arc<Self>,
        connection: &Arc<Connection>,
        text: &str,
    ) -> Option<JoinHandle<()>> {
        let action = match parse_action(text) {
            Ok(action) => action,
            Err(e @ FrameError::UnknownAction(_)) => {
                debug!(connection_id = %connection.id, error = %e, "Ignoring frame");
                return None;
            }
            Err(e) => {
                warn!(connection_id = %connection.id, error = %e, "Ignoring frame");
                return None;
            }
        };

        let hub = Arc::clone(self);
        let connection = Arc::clone(connection);
        Some(tokio::spawn(async move {
            hub.handle_action(&connection, action).await;
        }))
    }

    /// Run one action on behalf of a connection.
    ///
    /// `get` answers the requester only. Successful mutations are broadcast
    /// to the whole group; failures go back to the requester only.
    pub async fn handle_action(&self, connection: &Connection, action: Action) {
        debug!(
            connection_id = %connection.id,
            group_id = %connection.group_id,
            action = action.name(),
            "Handling action"
        );

        let pile = &connection.pile;
        let removes_member = matches!(action, Action::Kick(_));
        let result: Result<Group, RepositoryError> = match action {
            Action::Get => {
                let frame = match self.repository.get_group_by_id(&connection.group_id, pile) {
                    Ok(view) => OutboundFrame::Update(view),
                    Err(e) => {
                        log_failure(connection, "get", &e);
                        OutboundFrame::from(&e)
                    }
                };
                self.reply(connection, &frame).await;
                return;
            }
            Action::SendCoordinates(payload) => self.repository.update_member_coords_bit(
                &payload.member_id,
                CoordsBit::now(payload.lat, payload.lng),
                pile,
            ),
            Action::UpdateRole(payload) => {
                self.repository
                    .update_member_role(&payload.member_id, payload.role, pile)
            }
            Action::Kick(payload) => self.repository.kick_member(&payload.member_id, pile),
        };

        match result {
            Ok(group) => {
                let delivered = self
                    .broadcast(&group.id, &OutboundFrame::Update(group.export()))
                    .await;
                debug!(group_id = %group.id, delivered, "Broadcast group update");
                if removes_member {
                    self.evict_non_members(&group).await;
                }
            }
            Err(e) => {
                log_failure(connection, "mutation", &e);
                self.reply(connection, &OutboundFrame::from(&e)).await;
            }
        }
    }

    /// Start the closing handshake on every registered connection.
    ///
    /// Registrations stay in place; each read loop deregisters its own
    /// connection when the peer's close arrives.
    pub async fn close_all(&self) -> usize {
        let connections: Vec<Arc<Connection>> =
            self.registry.lock().values().flatten().cloned().collect();

        let results = join_all(connections.iter().map(|c| c.close())).await;
        for (connection, result) in connections.iter().zip(results) {
            if let Err(e) = result {
                debug!(connection_id = %connection.id, error = %e, "Failed to close connection");
            }
        }

        info!(connections = connections.len(), "Closed all connections");
        connections.len()
    }
}

fn log_failure(connection: &Connection, action: &str, e: &RepositoryError) {
    match e {
        RepositoryError::Storage(_) => error!(
            connection_id = %connection.id,
            action,
            error = %e,
            "Action failed"
        ),
        _ => debug!(
            connection_id = %connection.id,
            action,
            error = %e,
            "Action rejected"
        ),
    }
}
