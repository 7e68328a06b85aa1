//! WebSocket transport for signaling connections.
//!
//! Each socket gets a writer task that drains the connection's outbound queue
//! and sends keep-alive pings, while the reader loop feeds text frames to the
//! relay engine in arrival order. When the reader stops, for any reason, the
//! connection is disconnected from the engine exactly once.

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::AppState;
use crate::registry::ConnectionHandle;

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let subject = match state.auth.as_deref() {
        None => None,
        Some(validator) => match validator.authorize(&headers, params.token.as_deref()) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                warn!(error = %e, "Rejected WebSocket upgrade");
                return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
            }
        },
    };

    ws.max_message_size(state.max_message_bytes)
        .on_upgrade(move |socket| {
            let handle = ConnectionHandle::new();
            let span = info_span!(
                "ws",
                conn = %handle,
                user = subject.as_deref().unwrap_or("-")
            );
            handle_socket(socket, state, handle).instrument(span)
        })
}

async fn handle_socket(mut socket: WebSocket, state: AppState, handle: ConnectionHandle) {
    let engine = state.engine;
    let mut outbox = match engine.connect(handle.clone()).await {
        Ok(rx) => rx,
        Err(e) => {
            // The registered entry belongs to someone else; leave it alone.
            error!(error = %e, "Connection rejected");
            let _ = socket.close().await;
            return;
        }
    };
    info!("WebSocket client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    let ping_interval = state.ping_interval;
    let mut writer = tokio::spawn(
        async move {
            let mut ping = tokio::time::interval(ping_interval);
            ping.tick().await;
            loop {
                tokio::select! {
                    event = outbox.recv() => {
                        let Some(event) = event else { break };
                        let text = match event.to_json() {
                            Ok(text) => text,
                            Err(e) => {
                                warn!(error = %e, event = event.name(), "Failed to encode event");
                                continue;
                            }
                        };
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    _ = ping.tick() => {
                        if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                            break;
                        }
                    }
                }
            }
            let _ = ws_tx.close().await;
        }
        .in_current_span(),
    );

    let reader = async {
        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(e) = engine.handle_message(&handle, text.as_str()).await {
                        error!(error = %e, "Relay invariant violated, closing connection");
                        break;
                    }
                }
                Ok(Message::Binary(_)) => debug!("Ignoring binary frame"),
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(error = %e, "WebSocket read error");
                    break;
                }
            }
        }
    };

    tokio::select! {
        () = reader => {}
        _ = &mut writer => debug!("Writer stopped"),
    }

    if let Err(e) = engine.disconnect(&handle).await {
        error!(error = %e, "Disconnect cleanup failed");
    }
    writer.abort();
    info!("WebSocket client disconnected");
}
