//! `ePédiaCare` Core Library
//!
//! Shared functionality for `ePédiaCare` services:
//! - Configuration resolution and hierarchy
//! - Common error types
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod tracing_init;

pub use config::SignalingConfig;
pub use error::{Error, Result};
