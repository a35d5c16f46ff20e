//! HTTP read path next to the WebSocket endpoint.
//!
//! `/v1/groups/:group_id/messages` returns durable history; it is the refetch
//! target after a client invalidates its cached message list.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::app_state::AppState;

pub async fn group_messages(State(app): State<AppState>, Path(group_id): Path<String>) -> Response {
    let limit = app.cfg().limits.history_limit;
    match app.store().list(&group_id, limit).await {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => {
            tracing::warn!(group = %group_id, error = %e, "history read failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.client_code().as_str()).into_response()
        }
    }
}
