//! Shared test harness: in-memory connector and a recording handler.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration, Instant};

use safechat_client::{ChatHandler, ConnectionManager, ConnectionState, Connector, Transport};
use safechat_core::error::{Result, SafechatError};
use safechat_core::message::ChatMessage;
use safechat_core::protocol::{encode, Envelope};

/// Server half of one in-memory connection. Dropping it closes the connection.
pub struct ServerEnd {
    pub from_client: mpsc::UnboundedReceiver<String>,
    pub to_client: mpsc::UnboundedSender<Result<String>>,
    pub opened_at: Instant,
}

impl ServerEnd {
    pub async fn next_frame(&mut self) -> Value {
        let frame = timeout(Duration::from_secs(30), self.from_client.recv())
            .await
            .expect("timed out waiting for client frame")
            .expect("client side closed");
        serde_json::from_str(&frame).unwrap()
    }

    pub fn assert_no_frame(&mut self) {
        if let Ok(frame) = self.from_client.try_recv() {
            panic!("unexpected client frame {frame}");
        }
    }

    pub fn push_raw(&self, frame: &str) {
        self.to_client.send(Ok(frame.to_string())).unwrap();
    }

    pub fn push(&self, env: &Envelope) {
        self.push_raw(&encode(env).unwrap());
    }

    /// Simulate an abnormal close.
    pub fn fail(self) {
        let _ = self
            .to_client
            .send(Err(SafechatError::Transport("connection reset".into())));
    }
}

pub struct MemoryConnector {
    opened: mpsc::UnboundedSender<ServerEnd>,
    attempts: AtomicUsize,
    failures_left: AtomicUsize,
}

impl MemoryConnector {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ServerEnd>) {
        let (opened, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            opened,
            attempts: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
        });
        (connector, rx)
    }

    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _url: &str) -> Result<Transport> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SafechatError::Transport("connection refused".into()));
        }

        let (client_tx, from_client) = mpsc::unbounded_channel::<String>();
        let (to_client, client_rx) = mpsc::unbounded_channel::<Result<String>>();

        let sink = futures_util::sink::unfold(client_tx, |tx, frame: String| async move {
            tx.send(frame)
                .map_err(|_| SafechatError::Transport("peer gone".into()))?;
            Ok::<_, SafechatError>(tx)
        });
        let stream = futures_util::stream::unfold(client_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });

        let _ = self.opened.send(ServerEnd {
            from_client,
            to_client,
            opened_at: Instant::now(),
        });
        Ok(Transport::new(sink, stream))
    }
}

/// Connector whose attempts never complete; the manager stays `Connecting`.
pub struct PendingConnector;

#[async_trait]
impl Connector for PendingConnector {
    async fn connect(&self, _url: &str) -> Result<Transport> {
        std::future::pending().await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Message(ChatMessage),
    Typing(String),
    Error(String),
    Joined(String),
    Left(String),
}

#[derive(Clone)]
pub struct Recorder {
    tx: mpsc::UnboundedSender<Event>,
}

impl Recorder {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ChatHandler for Recorder {
    fn on_message(&self, message: &ChatMessage) {
        let _ = self.tx.send(Event::Message(message.clone()));
    }
    fn on_user_typing(&self, user_id: &str) {
        let _ = self.tx.send(Event::Typing(user_id.to_string()));
    }
    fn on_error(&self, error_text: &str) {
        let _ = self.tx.send(Event::Error(error_text.to_string()));
    }
    fn on_user_joined(&self, user_id: &str) {
        let _ = self.tx.send(Event::Joined(user_id.to_string()));
    }
    fn on_user_left(&self, user_id: &str) {
        let _ = self.tx.send(Event::Left(user_id.to_string()));
    }
}

pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(Duration::from_secs(30), rx.recv())
        .await
        .expect("timed out waiting for callback")
        .expect("recorder dropped")
}

pub async fn wait_state(mgr: &ConnectionManager, want: ConnectionState) {
    let mut rx = mgr.watch_state();
    timeout(Duration::from_secs(30), rx.wait_for(|s| *s == want))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {want:?}"))
        .expect("state channel closed");
}

pub fn chat_message(id: u64, group: &str, sender: &str, content: &str) -> ChatMessage {
    ChatMessage {
        id,
        group_id: group.into(),
        sender_id: sender.into(),
        content: content.into(),
        attachment_url: None,
        created_at: 1_700_000_000_000,
    }
}
