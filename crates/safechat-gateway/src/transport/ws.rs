//! WebSocket handler.
//!
//! Responsibilities:
//! - Resolve the `ticket` query parameter before upgrading (401 otherwise)
//! - Register the session's outbound queue with the realtime core
//! - Lifecycle: ping/pong + idle timeout
//! - Size check, decode once, hand envelopes to the chat router
//! - On exit: `user_left` to the session's group, registry cleanup
//!
//! Protocol violations and undecodable frames are answered with an `error`
//! envelope; they never close the socket.

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use safechat_core::error::{Result, SafechatError};
use safechat_core::protocol::{codec as envelope_codec, Envelope};

use crate::app_state::AppState;
use crate::context::session::{resolve_session, SessionMeta};
use crate::realtime::{Connection, RealtimeCtx};
use crate::transport::codec::{decode, frame_len, Inbound};

const OUTBOUND_QUEUE: usize = 1024;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    pub ticket: String,
}

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(
    State(app): State<AppState>,
    ws: WebSocketUpgrade,
    Query(q): Query<WsQuery>,
) -> Response {
    let meta = match resolve_session(&app, &q.ticket) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::warn!(error = %e, "ws upgrade rejected");
            return (StatusCode::UNAUTHORIZED, e.client_code().as_str()).into_response();
        }
    };

    let span = tracing::info_span!("session", session = meta.session_id, user = %meta.user_id);
    ws.on_upgrade(move |socket| run_session(app, meta, socket).instrument(span))
}

/// Queue an envelope for this session without waiting on its own writer.
fn reply(out_tx: &mpsc::Sender<Message>, env: &Envelope) {
    match envelope_codec::encode(env) {
        Ok(s) => {
            if out_tx.try_send(Message::Text(s)).is_err() {
                tracing::debug!(kind = env.kind().as_str(), "reply dropped, outbound queue full");
            }
        }
        Err(e) => tracing::warn!(error = %e, "reply encode failed"),
    }
}

// --------------------
// Core session loop
// --------------------
async fn run_session(app: AppState, meta: SessionMeta, socket: WebSocket) {
    let core = app.realtime();
    let (out_tx, out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);

    core.sessions.insert(
        meta.session_id(),
        Connection {
            user_id: meta.user_id().into(),
            tx: out_tx.clone(),
        },
    );
    let ctx = RealtimeCtx::new(meta.session_id(), meta.user_id(), core.clone());
    tracing::info!("session opened");

    if let Err(e) = session_loop(&app, &ctx, socket, out_tx, out_rx).await {
        tracing::debug!(error = %e, "session ended with error");
    }

    app.chat().on_disconnect(&ctx).await;
    core.sessions.remove(meta.session_id());
    tracing::info!("session closed");
}

async fn session_loop(
    app: &AppState,
    ctx: &RealtimeCtx,
    socket: WebSocket,
    out_tx: mpsc::Sender<Message>,
    mut out_rx: mpsc::Receiver<Message>,
) -> Result<()> {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let gw = &app.cfg().gateway;
    let max_frame_bytes = app.cfg().limits.max_frame_bytes;
    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);

    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(m) = maybe_out else { break; };
                ws_tx
                    .send(m)
                    .await
                    .map_err(|e| SafechatError::Transport(format!("ws send failed: {e}")))?;
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let msg = incoming.map_err(|e| SafechatError::Transport(format!("ws recv failed: {e}")))?;

                last_activity = Instant::now();

                if frame_len(&msg) > max_frame_bytes {
                    reply(&out_tx, &Envelope::error(SafechatError::PayloadTooLarge.to_string()));
                    continue;
                }

                match decode(msg) {
                    Ok(Inbound::Envelope { env, bytes_len }) => {
                        tracing::debug!(kind = env.kind().as_str(), bytes_len, "inbound");
                        if let Err(e) = app.chat().handle(ctx, env).await {
                            tracing::debug!(error = %e, "rejected inbound envelope");
                            reply(&out_tx, &Envelope::error(e.to_string()));
                        }
                    }
                    Ok(Inbound::Ping(payload)) => {
                        let _ = out_tx.try_send(Message::Pong(payload));
                    }
                    Ok(Inbound::Pong(_)) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "undecodable frame");
                        reply(&out_tx, &Envelope::error(e.to_string()));
                    }
                }
            }

            // ping
            _ = ping_tick.tick() => {
                let _ = out_tx.try_send(Message::Ping(Vec::new()));
            }

            // idle timeout
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                if last_activity.elapsed() >= idle_timeout {
                    reply(&out_tx, &Envelope::error("idle timeout"));
                    // best-effort flush of the notice before closing
                    while let Ok(m) = out_rx.try_recv() {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    break;
                }
            }
        }
    }

    let _ = ws_tx.close().await;
    Ok(())
}
