//! Relay engine: join, signal and disconnect handling for signaling peers.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};

use crate::protocol::{ClientEvent, Role, ServerEvent};
use crate::registry::{Assignment, ConnectionHandle, ConnectionRegistry};
use crate::relay::RelayError;
use crate::rooms::{JoinOutcome, RoomTable};

/// Registry and room table, always locked together.
#[derive(Default)]
pub struct SignalingState {
    connections: ConnectionRegistry,
    rooms: RoomTable,
}

impl SignalingState {
    pub const fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    pub const fn rooms(&self) -> &RoomTable {
        &self.rooms
    }

    /// Verify that every occupied slot matches exactly one registry
    /// assignment and vice versa.
    pub fn check_consistency(&self) -> Result<(), RelayError> {
        for (room_id, role, handle) in self.rooms.occupied_slots() {
            let matches = matches!(
                self.connections.lookup(handle),
                Ok(Some(a)) if a.room_id == room_id && a.role == role
            );
            if !matches {
                return Err(RelayError::SlotDesync {
                    room_id: room_id.to_string(),
                    role,
                    handle: handle.clone(),
                });
            }
        }
        for (handle, a) in self.connections.assignments() {
            if self.rooms.occupant(&a.room_id, a.role) != Some(handle) {
                return Err(RelayError::SlotDesync {
                    room_id: a.room_id.clone(),
                    role: a.role,
                    handle: handle.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Snapshot reported by the liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayStatus {
    pub sessions: usize,
    pub connections: usize,
}

/// Owns all signaling state. Join and disconnect hold the write lock for the
/// whole event so the registry and room table never diverge.
pub struct RelayEngine {
    state: RwLock<SignalingState>,
    outbound_queue: usize,
}

impl RelayEngine {
    pub fn new(outbound_queue: usize) -> Self {
        Self {
            state: RwLock::new(SignalingState::default()),
            outbound_queue: outbound_queue.max(1),
        }
    }

    /// Register a transport connection and acknowledge it with its handle.
    ///
    /// The returned receiver yields every event addressed to this connection.
    pub async fn connect(
        &self,
        handle: ConnectionHandle,
    ) -> Result<mpsc::Receiver<ServerEvent>, RelayError> {
        let (tx, rx) = mpsc::channel(self.outbound_queue);
        let mut state = self.state.write().await;
        state.connections.register(handle.clone(), tx)?;
        state.connections.send_to(
            &handle,
            ServerEvent::Connected {
                sid: handle.clone(),
            },
        );
        Ok(rx)
    }

    /// Place the connection into `role`'s slot of `session_id`.
    ///
    /// A different occupant of that slot is displaced without notice. The
    /// connection's own previous slot, if any, is vacated first and that
    /// slot's peer is told `peer_disconnected`.
    pub async fn join(
        &self,
        handle: &ConnectionHandle,
        session_id: Option<&str>,
        role: Role,
    ) -> Result<(), RelayError> {
        let room_id = match session_id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(RelayError::MissingSessionId),
        };

        let mut state = self.state.write().await;
        let SignalingState { connections, rooms } = &mut *state;

        let previous = connections.lookup(handle)?.cloned();
        if let Some(prev) = previous.filter(|p| p.room_id != room_id || p.role != role) {
            release_slot(connections, rooms, handle, &prev)?;
            info!(conn = %handle, room_id = %prev.room_id, role = %prev.role, "Left previous room");
        }

        if let JoinOutcome::Replaced { displaced } = rooms.join(room_id, role, handle.clone()) {
            warn!(
                conn = %handle,
                displaced = %displaced,
                room_id,
                %role,
                "Slot taken over, displaced connection is not notified"
            );
            if let Err(e) = connections.unassign(&displaced) {
                error!(error = %e, "Displaced slot occupant missing from registry");
            }
        }
        connections.assign(handle, room_id, role)?;
        info!(conn = %handle, room_id, %role, "Joined room");

        connections.send_to(
            handle,
            ServerEvent::Joined {
                role,
                session_id: room_id.to_string(),
            },
        );
        if let Some(peer) = rooms.peer_of(room_id, role) {
            connections.send_to(peer, ServerEvent::peer_joined(role, room_id));
        }
        Ok(())
    }

    /// Forward `data` verbatim to the occupant opposite `sender_role`.
    ///
    /// Dropped silently when that slot is empty or `sender_role` is not a
    /// known role.
    pub async fn signal(
        &self,
        handle: &ConnectionHandle,
        session_id: Option<&str>,
        sender_role: Option<&str>,
        data: Value,
    ) -> Result<(), RelayError> {
        let state = self.state.read().await;
        state.connections.get(handle)?;

        let room_id = session_id
            .filter(|id| state.rooms.contains(id))
            .ok_or(RelayError::InvalidSession)?;
        let Some(from) = sender_role.and_then(|r| r.parse::<Role>().ok()) else {
            debug!(conn = %handle, room_id, sender_role = ?sender_role, "Unknown sender role, signal dropped");
            return Ok(());
        };

        match state.rooms.peer_of(room_id, from) {
            Some(peer) => {
                state
                    .connections
                    .send_to(peer, ServerEvent::Signal { data, from });
                debug!(conn = %handle, room_id, %from, "Signal relayed");
            }
            None => {
                debug!(conn = %handle, room_id, %from, "No peer present, signal dropped");
            }
        }
        Ok(())
    }

    /// Drop the connection, vacating its slot and telling the peer.
    pub async fn disconnect(&self, handle: &ConnectionHandle) -> Result<(), RelayError> {
        let mut state = self.state.write().await;
        let SignalingState { connections, rooms } = &mut *state;

        if let Some(assignment) = connections.remove(handle)? {
            release_slot(connections, rooms, handle, &assignment)?;
            info!(
                conn = %handle,
                room_id = %assignment.room_id,
                role = %assignment.role,
                "Left room on disconnect"
            );
        }
        Ok(())
    }

    /// Dispatch one decoded client event.
    ///
    /// User-facing failures are answered with an `error` event to the sender
    /// only; fatal errors are returned for the transport to close the
    /// connection.
    pub async fn handle_event(
        &self,
        handle: &ConnectionHandle,
        event: ClientEvent,
    ) -> Result<(), RelayError> {
        let name = event.name();
        let result = match event {
            ClientEvent::JoinAsPatient(req) => {
                self.join(handle, req.session_id.as_deref(), Role::Patient)
                    .await
            }
            ClientEvent::JoinAsPractitioner(req) => {
                self.join(handle, req.session_id.as_deref(), Role::Practitioner)
                    .await
            }
            ClientEvent::Signal(req) => {
                self.signal(
                    handle,
                    req.session_id.as_deref(),
                    req.sender_role.as_deref(),
                    req.data,
                )
                .await
            }
        };
        match result {
            Err(e) if !e.is_fatal() => {
                debug!(conn = %handle, event = name, error = ?e, "Rejected client event");
                self.reply_error(handle, &e).await;
                Ok(())
            }
            other => other,
        }
    }

    /// Decode and dispatch one text frame.
    pub async fn handle_message(
        &self,
        handle: &ConnectionHandle,
        text: &str,
    ) -> Result<(), RelayError> {
        match ClientEvent::parse(text) {
            Ok(event) => self.handle_event(handle, event).await,
            Err(e) => {
                debug!(conn = %handle, error = ?e, "Undecodable client frame");
                self.reply_error(handle, &e).await;
                Ok(())
            }
        }
    }

    async fn reply_error(&self, handle: &ConnectionHandle, err: &RelayError) {
        self.state
            .read()
            .await
            .connections
            .send_to(handle, ServerEvent::error(err));
    }

    pub async fn status(&self) -> RelayStatus {
        let state = self.state.read().await;
        RelayStatus {
            sessions: state.rooms.len(),
            connections: state.connections.len(),
        }
    }

    /// Run [`SignalingState::check_consistency`] under the read lock.
    pub async fn verify_consistency(&self) -> Result<(), RelayError> {
        self.state.read().await.check_consistency()
    }

    /// Read-only access to the state, for inspection.
    pub async fn inspect<R>(&self, f: impl FnOnce(&SignalingState) -> R) -> R {
        f(&*self.state.read().await)
    }
}

/// Vacate `handle`'s slot and notify whoever holds the opposite one.
///
/// Fails without touching the table if the slot is not held by `handle`.
fn release_slot(
    connections: &ConnectionRegistry,
    rooms: &mut RoomTable,
    handle: &ConnectionHandle,
    assignment: &Assignment,
) -> Result<(), RelayError> {
    let Assignment { room_id, role } = assignment;
    if rooms.occupant(room_id, *role) != Some(handle) {
        error!(conn = %handle, room_id = %room_id, role = %role, "Slot does not hold this connection");
        return Err(RelayError::SlotDesync {
            room_id: room_id.clone(),
            role: *role,
            handle: handle.clone(),
        });
    }
    rooms.leave(room_id, *role);
    if let Some(peer) = rooms.peer_of(room_id, *role) {
        connections.send_to(peer, ServerEvent::PeerDisconnected {});
    }
    Ok(())
}
