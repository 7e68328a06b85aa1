//! The two named participant slots of a room.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::relay::RelayError;

/// Participant role; each room has exactly one slot per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Practitioner,
}

impl Role {
    pub const ALL: [Self; 2] = [Self::Patient, Self::Practitioner];

    /// The role occupying the other slot of the same room.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Patient => Self::Practitioner,
            Self::Practitioner => Self::Patient,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Practitioner => "practitioner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Self::Patient),
            "practitioner" => Ok(Self::Practitioner),
            other => Err(RelayError::InvalidRole(other.to_string())),
        }
    }
}
