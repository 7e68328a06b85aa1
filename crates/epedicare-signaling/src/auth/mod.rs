//! Optional access-token gating for signaling connections.
//!
//! Tokens are issued by the ePédiaCare auth backend; the relay only
//! validates them.

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{AuthError, TokenValidator};
