//! ePédiaCare Signaling Relay Library
//!
//! Pairs one patient and one practitioner per consultation room and relays
//! WebRTC negotiation between them:
//! - Wire protocol events and participant roles
//! - Connection registry and room table, updated together by the relay engine
//! - Optional JWT access-token gating
//! - axum WebSocket transport and `/health` probe

pub mod auth;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod rooms;
pub mod server;
