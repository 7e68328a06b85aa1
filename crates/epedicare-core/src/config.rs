//! Configuration resolution for the signaling relay.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Config file (explicit `--config` path, or the global
//!    `<config dir>/epedicare/signaling.json` when present)
//! 3. Environment variables (`EPEDICARE_*`)
//! 4. CLI arguments (highest priority, applied by the binary)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Complete signaling relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SignalingConfig {
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub auth: AuthConfig,
    pub log: LogConfig,
}

/// HTTP / WebSocket listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Largest accepted inbound WebSocket message.
    pub max_message_bytes: usize,
    /// Allowed CORS origins. Empty means any origin.
    pub allowed_origins: Vec<String>,
    /// Interval between transport-level keep-alive pings.
    pub ping_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 5001)),
            max_message_bytes: 64 * 1024,
            allowed_origins: Vec::new(),
            ping_interval_secs: 30,
        }
    }
}

/// Relay engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RelayConfig {
    /// Capacity of each connection's outbound event queue.
    pub outbound_queue: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { outbound_queue: 64 }
    }
}

/// Access-token gating for incoming connections.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret shared with the auth backend. `None` accepts everyone.
    pub jwt_secret: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Load configuration with hierarchical resolution.
///
/// An explicit path must exist; the global file is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<SignalingConfig> {
    let mut config = match explicit {
        Some(path) => load_config_file(path)?,
        None => match global_config_path() {
            Some(global) if global.exists() => load_config_file(&global)?,
            _ => SignalingConfig::default(),
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("epedicare").join("signaling.json"))
}

fn load_config_file(path: &Path) -> Result<SignalingConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let config = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;
    tracing::debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Apply `EPEDICARE_*` overrides read through `lookup`.
///
/// Unparseable numeric or address values are ignored.
pub fn apply_env_overrides(config: &mut SignalingConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("EPEDICARE_ADDR") {
        if let Ok(addr) = val.parse() {
            config.server.addr = addr;
        }
    }
    if let Some(val) = lookup("EPEDICARE_OUTBOUND_QUEUE") {
        if let Ok(n) = val.parse() {
            config.relay.outbound_queue = n;
        }
    }
    if let Some(val) = lookup("EPEDICARE_JWT_SECRET") {
        if !val.is_empty() {
            config.auth.jwt_secret = Some(val);
        }
    }
    if let Some(val) = lookup("EPEDICARE_LOG_LEVEL") {
        config.log.level = val;
    }
}
