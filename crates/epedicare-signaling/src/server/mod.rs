//! HTTP surface: WebSocket signaling endpoint and liveness probe.

pub mod health;
pub mod ws;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use epedicare_core::SignalingConfig;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::TokenValidator;
use crate::relay::RelayEngine;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RelayEngine>,
    /// `None` accepts unauthenticated connections.
    pub auth: Option<Arc<TokenValidator>>,
    pub max_message_bytes: usize,
    pub ping_interval: Duration,
    pub allowed_origins: Arc<[String]>,
}

impl AppState {
    pub fn from_config(config: &SignalingConfig) -> Self {
        Self {
            engine: Arc::new(RelayEngine::new(config.relay.outbound_queue)),
            auth: config
                .auth
                .jwt_secret
                .as_deref()
                .map(|secret| Arc::new(TokenValidator::new(secret.as_bytes()))),
            max_message_bytes: config.server.max_message_bytes,
            ping_interval: Duration::from_secs(config.server.ping_interval_secs.max(1)),
            allowed_origins: config.server.allowed_origins.clone().into(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.allowed_origins);
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health::health))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET])
        .allow_headers(Any)
}
