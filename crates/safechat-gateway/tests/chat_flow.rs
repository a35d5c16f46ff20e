//! End-to-end fan-out tests against a real gateway on an ephemeral port.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use safechat_gateway::app_state::AppState;
use safechat_gateway::{config, router};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CFG: &str = r#"
version: 1
limits:
  max_frame_bytes: 1024
  max_content_chars: 200
auth:
  tickets:
    ta: "user:a"
    tb: "user:b"
    tc: "user:c"
"#;

async fn start_gateway() -> (SocketAddr, AppState) {
    let cfg = config::load_from_str(CFG).unwrap();
    let state = AppState::new(cfg).unwrap();
    let app = router::build_router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr, ticket: &str) -> Ws {
    let (ws, _) = connect_async(format!("ws://{addr}/v1/ws?ticket={ticket}"))
        .await
        .expect("ws connect");
    ws
}

async fn send(ws: &mut Ws, v: Value) {
    ws.send(Message::text(v.to_string())).await.unwrap();
}

/// Next text frame as JSON, skipping transport pings.
async fn recv(ws: &mut Ws) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("ws error");
        match msg {
            Message::Text(t) => return serde_json::from_str(t.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame {other:?}"),
        }
    }
}

/// Ping/pong round trip: everything sent before it has been handled.
async fn sync(ws: &mut Ws) {
    send(ws, json!({"type": "ping"})).await;
    assert_eq!(recv(ws).await, json!({"type": "pong"}));
}

async fn join(ws: &mut Ws, group: &str) {
    send(ws, json!({"type": "join", "groupId": group})).await;
    sync(ws).await;
}

async fn assert_silent(ws: &mut Ws) {
    sync(ws).await;
}

#[tokio::test]
async fn message_reaches_group_peers_only() {
    let (addr, state) = start_gateway().await;
    let mut a = connect(addr, "ta").await;
    let mut b = connect(addr, "tb").await;
    let mut c = connect(addr, "tc").await;

    join(&mut a, "g1").await;
    join(&mut b, "g1").await;
    join(&mut c, "g2").await;
    assert_eq!(recv(&mut a).await, json!({"type": "user_joined", "usuarioId": "user:b"}));

    send(&mut a, json!({"type": "message", "contenido": "hola"})).await;

    let got = recv(&mut b).await;
    assert_eq!(got["type"], "new_message");
    assert_eq!(got["mensaje"]["content"], "hola");
    assert_eq!(got["mensaje"]["groupId"], "g1");
    assert_eq!(got["mensaje"]["senderId"], "user:a");

    assert_silent(&mut a).await;
    assert_silent(&mut c).await;

    let stored = state.store().list("g1", 10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content, "hola");
    assert_eq!(got["mensaje"]["id"], stored[0].id);
}

#[tokio::test]
async fn typing_is_broadcast_but_not_persisted() {
    let (addr, state) = start_gateway().await;
    let mut a = connect(addr, "ta").await;
    let mut b = connect(addr, "tb").await;
    join(&mut a, "g1").await;
    join(&mut b, "g1").await;
    let _ = recv(&mut a).await; // user_joined b

    send(&mut b, json!({"type": "typing"})).await;
    assert_eq!(recv(&mut a).await, json!({"type": "user_typing", "usuarioId": "user:b"}));
    assert!(state.store().list("g1", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn payload_before_join_is_an_error_not_a_disconnect() {
    let (addr, _) = start_gateway().await;
    let mut a = connect(addr, "ta").await;

    send(&mut a, json!({"type": "message", "contenido": "hola"})).await;
    let err = recv(&mut a).await;
    assert_eq!(err["type"], "error");
    assert!(err["message"].as_str().unwrap().contains("join"));

    send(&mut a, json!({"type": "typing"})).await;
    assert_eq!(recv(&mut a).await["type"], "error");

    join(&mut a, "g1").await;
}

#[tokio::test]
async fn malformed_and_oversized_frames_keep_the_socket_open() {
    let (addr, _) = start_gateway().await;
    let mut a = connect(addr, "ta").await;

    a.send(Message::text("{not json")).await.unwrap();
    assert_eq!(recv(&mut a).await["type"], "error");

    send(&mut a, json!({"type": "teleport"})).await;
    assert_eq!(recv(&mut a).await["type"], "error");

    // server-only variants are refused when sent by a client
    send(&mut a, json!({"type": "pong"})).await;
    assert_eq!(recv(&mut a).await["type"], "error");

    let huge = "x".repeat(2048);
    send(&mut a, json!({"type": "message", "contenido": huge})).await;
    assert_eq!(recv(&mut a).await["type"], "error");

    sync(&mut a).await;
}

#[tokio::test]
async fn closing_announces_user_left() {
    let (addr, state) = start_gateway().await;
    let mut a = connect(addr, "ta").await;
    let mut b = connect(addr, "tb").await;
    join(&mut a, "g1").await;
    join(&mut b, "g1").await;
    let _ = recv(&mut a).await; // user_joined b

    b.close(None).await.unwrap();
    assert_eq!(recv(&mut a).await, json!({"type": "user_left", "usuarioId": "user:b"}));
    assert_eq!(state.realtime().presence.members("g1").len(), 1);
}

#[tokio::test]
async fn rejoin_moves_session_between_groups() {
    let (addr, _) = start_gateway().await;
    let mut a = connect(addr, "ta").await;
    let mut b = connect(addr, "tb").await;
    let mut c = connect(addr, "tc").await;
    join(&mut b, "g1").await;
    join(&mut c, "g2").await;

    join(&mut a, "g1").await;
    assert_eq!(recv(&mut b).await, json!({"type": "user_joined", "usuarioId": "user:a"}));

    join(&mut a, "g2").await;
    assert_eq!(recv(&mut b).await, json!({"type": "user_left", "usuarioId": "user:a"}));
    assert_eq!(recv(&mut c).await, json!({"type": "user_joined", "usuarioId": "user:a"}));

    send(&mut a, json!({"type": "message", "contenido": "ya estoy aqui"})).await;
    assert_eq!(recv(&mut c).await["mensaje"]["groupId"], "g2");
    assert_silent(&mut b).await;
}

#[tokio::test]
async fn unknown_ticket_is_refused_before_upgrade() {
    let (addr, _) = start_gateway().await;
    let res = connect_async(format!("ws://{addr}/v1/ws?ticket=nope")).await;
    assert!(res.is_err());
}

#[tokio::test]
async fn history_route_serves_persisted_messages() {
    let (addr, _) = start_gateway().await;
    let mut a = connect(addr, "ta").await;
    join(&mut a, "g1").await;
    send(
        &mut a,
        json!({"type": "message", "contenido": "con foto", "archivoUrl": "/uploads/1.png"}),
    )
    .await;
    sync(&mut a).await;

    let mut tcp = TcpStream::connect(addr).await.unwrap();
    tcp.write_all(b"GET /v1/groups/g1/messages HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    tcp.read_to_string(&mut raw).await.unwrap();

    assert!(raw.starts_with("HTTP/1.1 200"), "{raw}");
    let body = raw.split("\r\n\r\n").nth(1).unwrap();
    let v: Value = serde_json::from_str(body).unwrap();
    assert_eq!(v[0]["content"], "con foto");
    assert_eq!(v[0]["attachmentUrl"], "/uploads/1.png");
    assert_eq!(v[0]["senderId"], "user:a");
}
