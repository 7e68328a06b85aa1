//! Relay error taxonomy.

use crate::protocol::Role;
use crate::registry::ConnectionHandle;

/// Errors raised while handling a connection's events.
///
/// The `Display` text of the user-facing variants is what the client receives
/// in an `error` event.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("session_id requis")]
    MissingSessionId,

    #[error("Session invalide")]
    InvalidSession,

    #[error("Rôle invalide")]
    InvalidRole(String),

    #[error("Message invalide")]
    MalformedMessage(String),

    #[error("connection {0} is already registered")]
    DuplicateConnection(ConnectionHandle),

    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionHandle),

    #[error("registry and room table disagree on {role} slot of room {room_id} for connection {handle}")]
    SlotDesync {
        room_id: String,
        role: Role,
        handle: ConnectionHandle,
    },
}

impl RelayError {
    /// Invariant violations end the connection instead of being reported to it.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DuplicateConnection(_) | Self::UnknownConnection(_) | Self::SlotDesync { .. }
        )
    }
}
