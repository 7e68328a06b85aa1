//! `GET /health` liveness probe.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;
use crate::relay::RelayStatus;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub relay: RelayStatus,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        relay: state.engine.status().await,
    })
}
