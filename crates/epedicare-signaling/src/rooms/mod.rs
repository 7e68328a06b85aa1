//! Two-slot rooms keyed by caller-chosen session id.

pub mod table;

pub use table::{JoinOutcome, Room, RoomTable};
