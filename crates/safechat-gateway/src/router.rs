//! Axum router wiring (HTTP -> WS upgrade, history, ops).

use axum::{routing::get, Router};

use safechat_core::protocol::WS_PATH;

use crate::{api, app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(WS_PATH, get(transport::ws::ws_upgrade))
        .route("/v1/groups/:group_id/messages", get(api::group_messages))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .with_state(state)
}
