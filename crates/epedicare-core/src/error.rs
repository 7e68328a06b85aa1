//! Error types for `ePédiaCare` core library.

use thiserror::Error;

/// Result type alias using the core `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types shared by `ePédiaCare` services.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file missing, unreadable or malformed.
    #[error("Configuration error: {0}")]
    Config(String),
}
