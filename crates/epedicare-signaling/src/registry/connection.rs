//! In-memory connection registry for signaling peers.
//!
//! The registry is not internally synchronized: it lives next to the
//! [`RoomTable`](crate::rooms::RoomTable) inside the relay engine's lock so
//! both are updated as one unit.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::protocol::{Role, ServerEvent};
use crate::relay::RelayError;

/// Opaque per-connection identifier handed out by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionHandle(String);

impl ConnectionHandle {
    /// A fresh random handle.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ConnectionHandle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The (room, role) pair a connection currently occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub room_id: String,
    pub role: Role,
}

/// Registry record for one live connection.
pub struct PeerConnection {
    /// Queue drained by the transport writer for this connection.
    outbox: mpsc::Sender<ServerEvent>,
    assignment: Option<Assignment>,
}

impl PeerConnection {
    /// Push an event without waiting. Returns `false` when it was not queued.
    pub fn send(&self, handle: &ConnectionHandle, event: ServerEvent) -> bool {
        let name = event.name();
        match self.outbox.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn = %handle, event = name, "Outbound queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(conn = %handle, event = name, "Outbound queue closed, dropping event");
                false
            }
        }
    }

    pub const fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }
}

/// Registry of live connections and their room assignments.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionHandle, PeerConnection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection in the "connected, unassigned" state.
    pub fn register(
        &mut self,
        handle: ConnectionHandle,
        outbox: mpsc::Sender<ServerEvent>,
    ) -> Result<(), RelayError> {
        if self.connections.contains_key(&handle) {
            return Err(RelayError::DuplicateConnection(handle));
        }
        info!(conn = %handle, "Connection registered");
        self.connections.insert(
            handle,
            PeerConnection {
                outbox,
                assignment: None,
            },
        );
        Ok(())
    }

    /// Set or overwrite the connection's room and role.
    pub fn assign(
        &mut self,
        handle: &ConnectionHandle,
        room_id: &str,
        role: Role,
    ) -> Result<(), RelayError> {
        let conn = self.get_mut(handle)?;
        conn.assignment = Some(Assignment {
            room_id: room_id.to_string(),
            role,
        });
        Ok(())
    }

    /// Return the connection to the unassigned state, yielding what it held.
    pub fn unassign(&mut self, handle: &ConnectionHandle) -> Result<Option<Assignment>, RelayError> {
        Ok(self.get_mut(handle)?.assignment.take())
    }

    pub fn lookup(&self, handle: &ConnectionHandle) -> Result<Option<&Assignment>, RelayError> {
        Ok(self.get(handle)?.assignment())
    }

    /// Remove a connection, returning its prior assignment.
    pub fn remove(&mut self, handle: &ConnectionHandle) -> Result<Option<Assignment>, RelayError> {
        let conn = self
            .connections
            .remove(handle)
            .ok_or_else(|| RelayError::UnknownConnection(handle.clone()))?;
        info!(conn = %handle, "Connection unregistered");
        Ok(conn.assignment)
    }

    pub fn get(&self, handle: &ConnectionHandle) -> Result<&PeerConnection, RelayError> {
        self.connections
            .get(handle)
            .ok_or_else(|| RelayError::UnknownConnection(handle.clone()))
    }

    fn get_mut(&mut self, handle: &ConnectionHandle) -> Result<&mut PeerConnection, RelayError> {
        self.connections
            .get_mut(handle)
            .ok_or_else(|| RelayError::UnknownConnection(handle.clone()))
    }

    /// Queue an event for a connection. Unknown handles are ignored.
    pub fn send_to(&self, handle: &ConnectionHandle, event: ServerEvent) -> bool {
        self.connections
            .get(handle)
            .is_some_and(|conn| conn.send(handle, event))
    }

    /// Iterate over assigned connections.
    pub fn assignments(&self) -> impl Iterator<Item = (&ConnectionHandle, &Assignment)> {
        self.connections
            .iter()
            .filter_map(|(h, c)| c.assignment.as_ref().map(|a| (h, a)))
    }

    /// Count of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registry_with(handle: &str) -> (ConnectionRegistry, mpsc::Receiver<ServerEvent>) {
        let mut registry = ConnectionRegistry::new();
        let (tx, rx) = mpsc::channel(4);
        registry.register(handle.into(), tx).unwrap();
        (registry, rx)
    }

    #[test]
    fn handles_are_unique() {
        assert_ne!(ConnectionHandle::new(), ConnectionHandle::new());
    }

    #[test]
    fn register_starts_unassigned() {
        let (registry, _rx) = registry_with("c1");
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup(&"c1".into()).unwrap().is_none());
    }

    #[test]
    fn duplicate_register_is_rejected() {
        let (mut registry, _rx) = registry_with("c1");
        let (tx, _rx2) = mpsc::channel(4);
        let err = registry.register("c1".into(), tx).unwrap_err();
        assert!(matches!(err, RelayError::DuplicateConnection(h) if h.as_str() == "c1"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn assign_overwrites_previous_assignment() {
        let (mut registry, _rx) = registry_with("c1");
        let h = ConnectionHandle::from("c1");
        registry.assign(&h, "s1", Role::Patient).unwrap();
        registry.assign(&h, "s2", Role::Practitioner).unwrap();

        let a = registry.lookup(&h).unwrap().unwrap();
        assert_eq!(a.room_id, "s2");
        assert_eq!(a.role, Role::Practitioner);
        assert_eq!(registry.assignments().count(), 1);
    }

    #[test]
    fn remove_returns_and_clears_assignment() {
        let (mut registry, _rx) = registry_with("c1");
        let h = ConnectionHandle::from("c1");
        registry.assign(&h, "s1", Role::Patient).unwrap();

        let prior = registry.remove(&h).unwrap();
        assert_eq!(
            prior,
            Some(Assignment {
                room_id: "s1".into(),
                role: Role::Patient
            })
        );
        assert!(registry.is_empty());
        assert!(matches!(
            registry.remove(&h),
            Err(RelayError::UnknownConnection(_))
        ));
    }

    #[test]
    fn unassign_yields_prior_assignment() {
        let (mut registry, _rx) = registry_with("c1");
        let h = ConnectionHandle::from("c1");
        registry.assign(&h, "s1", Role::Patient).unwrap();
        assert!(registry.unassign(&h).unwrap().is_some());
        assert!(registry.lookup(&h).unwrap().is_none());
        assert!(registry.unassign(&h).unwrap().is_none());
    }

    #[test]
    fn send_to_queues_event() {
        let (registry, mut rx) = registry_with("c1");
        assert!(registry.send_to(&"c1".into(), ServerEvent::PeerDisconnected {}));
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::PeerDisconnected {});
        assert!(!registry.send_to(&"ghost".into(), ServerEvent::PeerDisconnected {}));
    }

    #[test]
    fn send_to_full_or_closed_queue_is_dropped() {
        let mut registry = ConnectionRegistry::new();
        let (tx, rx) = mpsc::channel(1);
        registry.register("c1".into(), tx).unwrap();
        let h = ConnectionHandle::from("c1");

        assert!(registry.send_to(&h, ServerEvent::PeerDisconnected {}));
        assert!(!registry.send_to(&h, ServerEvent::PeerDisconnected {}));

        drop(rx);
        assert!(!registry.send_to(&h, ServerEvent::PeerDisconnected {}));
    }
}
