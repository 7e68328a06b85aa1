//! Live signaling connections and the room slot each one occupies.

pub mod connection;

pub use connection::{Assignment, ConnectionHandle, ConnectionRegistry, PeerConnection};
