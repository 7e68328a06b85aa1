//! Wire protocol: participant roles and the JSON events carried over the
//! WebSocket.

pub mod events;
pub mod role;

pub use events::{ClientEvent, JoinRequest, ServerEvent, SignalRequest};
pub use role::Role;
