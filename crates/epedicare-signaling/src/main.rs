//! ePédiaCare Signaling Relay
//!
//! WebSocket relay that pairs patients and practitioners for WebRTC calls.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use epedicare_core::SignalingConfig;
use epedicare_core::config::load_config;
use epedicare_core::tracing_init::init_tracing;
use epedicare_signaling::server::{self, AppState};

// Flags take precedence over the config file and the `EPEDICARE_*`
// environment variables, which only the config loader reads.
#[derive(Parser, Debug)]
#[command(name = "epedicare-signaling")]
#[command(
    version,
    about = "ePédiaCare signaling relay - pairs patients and practitioners for WebRTC calls"
)]
struct Args {
    /// Path to a JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// HS256 secret for access tokens. Unset accepts every connection.
    #[arg(long)]
    jwt_secret: Option<String>,

    /// Capacity of each connection's outbound queue.
    #[arg(long)]
    outbound_queue: Option<usize>,

    /// Log level for the relay (overridden by `RUST_LOG`).
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    apply_args(&mut config, args);

    init_tracing("epedicare_signaling", &config.log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        auth = config.auth.jwt_secret.is_some(),
        "Starting epedicare-signaling"
    );

    let listener = tokio::net::TcpListener::bind(config.server.addr).await?;
    let state = AppState::from_config(&config);

    server::serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal");
    })
    .await?;

    info!("Signaling relay stopped");
    Ok(())
}

fn apply_args(config: &mut SignalingConfig, args: Args) {
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(secret) = args.jwt_secret.filter(|s| !s.is_empty()) {
        config.auth.jwt_secret = Some(secret);
    }
    if let Some(queue) = args.outbound_queue {
        config.relay.outbound_queue = queue;
    }
    if let Some(level) = args.log_level {
        config.log.level = level;
    }
    config.log.json |= args.log_json;
}
