//! Relay engine: pairs patient and practitioner connections and forwards
//! WebRTC negotiation between them.

pub mod engine;
pub mod error;


pub use engine::{RelayEngine, RelayStatus, SignalingState};
pub use error::RelayError;
