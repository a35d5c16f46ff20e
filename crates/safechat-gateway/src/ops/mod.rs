//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/readyz`  : readiness, reports connected sessions and active groups

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app_state::AppState;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let rt = state.realtime();
    (
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "sessions": rt.sessions.len(),
            "groups": rt.presence.group_count(),
        })),
    )
}
