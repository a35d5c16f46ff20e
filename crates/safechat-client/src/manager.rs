//! Connection manager: one transport per bound group, fixed-delay reconnect.
//!
//! ```text
//! Idle --bind_group(g)--> Connecting --open--> Open (send join)
//! Connecting/Open --close/error--> Closed --reconnect_delay--> Connecting
//! any --teardown / bind_group("")--> Idle
//! ```
//!
//! A single driver task owns the transport. It is tagged with the epoch that
//! was current when it was spawned; `teardown` bumps the epoch before it aborts
//! the driver, so a close or inbound frame racing the teardown finds a stale
//! epoch and neither re-arms the reconnect nor reaches a callback.
//!
//! Callbacks run under the dispatch gate and re-check the epoch inside it.
//! `teardown` takes the gate once after bumping the epoch, so it returns only
//! after any in-flight callback has finished. A callback that tears down its
//! own manager skips that wait.

use std::cell::Cell;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use safechat_core::error::{Result, SafechatError};
use safechat_core::protocol::{codec, Envelope};

use crate::config::ClientConfig;
use crate::handler::{ChatHandler, HandlerSlot};
use crate::transport::{Connector, Transport, WsConnector};

/// Text handed to `on_error` when a server frame cannot be decoded.
pub const DECODE_ERROR_TEXT: &str = "malformed message from server";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
}

struct Inner {
    epoch: u64,
    group: Option<String>,
    /// Present only while `Open`.
    outbound: Option<mpsc::UnboundedSender<String>>,
    /// Present from `bind_group` until `teardown`.
    driver: Option<JoinHandle<()>>,
}

struct Shared {
    inner: Mutex<Inner>,
    /// Held for the duration of every callback.
    gate: Mutex<()>,
    handler: HandlerSlot,
    state_tx: watch::Sender<ConnectionState>,
}

thread_local! {
    /// Address of the `Shared` whose callback is running on this thread, or 0.
    static DISPATCHING: Cell<usize> = const { Cell::new(0) };
}

/// Marks the current thread as dispatching for one manager; restores on drop.
struct DispatchScope {
    prev: usize,
}

impl DispatchScope {
    fn enter(shared: &Shared) -> Self {
        let prev = DISPATCHING.with(|d| d.replace(shared.addr()));
        Self { prev }
    }
}

impl Drop for DispatchScope {
    fn drop(&mut self) {
        DISPATCHING.with(|d| d.set(self.prev));
    }
}

#[derive(Clone, Copy)]
struct Timing {
    reconnect_delay: Duration,
    ping_interval: Option<Duration>,
}

pub struct ConnectionManager {
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    runtime: Handle,
    url: String,
    timing: Timing,
}

impl ConnectionManager {
    /// Must be called from within a tokio runtime; the driver is spawned on it.
    pub fn new(config: &ClientConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current()
            .map_err(|_| SafechatError::Internal("connection manager requires a tokio runtime".into()))?;
        let (state_tx, _) = watch::channel(ConnectionState::Idle);

        Ok(Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    epoch: 0,
                    group: None,
                    outbound: None,
                    driver: None,
                }),
                gate: Mutex::new(()),
                handler: HandlerSlot::default(),
                state_tx,
            }),
            connector,
            runtime,
            url: config.ws_url()?,
            timing: Timing {
                reconnect_delay: config.reconnect_delay(),
                ping_interval: config.ping_interval(),
            },
        })
    }

    /// Manager over a real WebSocket.
    pub fn websocket(config: &ClientConfig) -> Result<Self> {
        Self::new(config, Arc::new(WsConnector))
    }

    pub fn with_handler(self, handler: Arc<dyn ChatHandler>) -> Self {
        self.shared.handler.set(handler);
        self
    }

    /// Replace the callbacks. Takes effect for the next inbound envelope.
    pub fn set_handler(&self, handler: Arc<dyn ChatHandler>) {
        self.shared.handler.set(handler);
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state_tx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    pub fn group_id(&self) -> Option<String> {
        self.shared.lock().group.clone()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Bind the manager to a group.
    ///
    /// Empty tears down. The same group while a driver is alive is a no-op.
    /// A different group tears the old connection down and opens a fresh one;
    /// its `join` goes out when that connection reaches `Open`.
    pub fn bind_group(&self, group_id: &str) {
        if group_id.is_empty() {
            self.teardown();
            return;
        }

        let replaced = {
            let mut inner = self.shared.lock();
            if inner.driver.is_some() && inner.group.as_deref() == Some(group_id) {
                return;
            }
            let replaced = self.shared.disarm(&mut inner);
            if replaced.is_some() {
                tracing::info!(from = ?inner.group, to = group_id, "switching group");
            }

            inner.group = Some(group_id.to_string());
            self.shared.set_state(ConnectionState::Connecting);
            let driver = drive(
                Arc::clone(&self.shared),
                Arc::clone(&self.connector),
                self.url.clone(),
                self.timing,
                inner.epoch,
            );
            inner.driver = Some(self.runtime.spawn(driver));
            replaced
        };

        if let Some(old) = replaced {
            old.abort();
            self.shared.wait_for_dispatch();
        }
    }

    /// Send a chat message. Fails with `NotConnected` unless `Open`; never blocks.
    pub fn send(&self, content: &str, attachment_url: Option<&str>) -> Result<()> {
        self.transmit(&Envelope::Message {
            content: content.to_string(),
            attachment_url: attachment_url.map(str::to_string),
        })
    }

    /// Best-effort typing notice. Returns whether it was queued.
    pub fn send_typing(&self) -> bool {
        match self.transmit(&Envelope::Typing) {
            Ok(()) => true,
            Err(e) => {
                tracing::trace!(error = %e, "typing notice skipped");
                false
            }
        }
    }

    /// Stop everything: pending reconnect, live socket, callbacks. Idempotent.
    ///
    /// Blocks until a callback running on another thread has returned.
    pub fn teardown(&self) {
        let driver = {
            let mut inner = self.shared.lock();
            let driver = self.shared.disarm(&mut inner);
            inner.group = None;
            self.shared.set_state(ConnectionState::Idle);
            driver
        };
        if let Some(driver) = driver {
            driver.abort();
            tracing::info!("connection torn down");
        }
        self.shared.wait_for_dispatch();
    }

    fn transmit(&self, env: &Envelope) -> Result<()> {
        let inner = self.shared.lock();
        if self.state() != ConnectionState::Open {
            return Err(SafechatError::NotConnected);
        }
        let tx = inner.outbound.as_ref().ok_or(SafechatError::NotConnected)?;
        let frame = codec::encode(env)?;
        tx.send(frame).map_err(|_| SafechatError::NotConnected)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn addr(&self) -> usize {
        self as *const Shared as usize
    }

    /// Make the current driver inert and hand it back for aborting.
    fn disarm(&self, inner: &mut Inner) -> Option<JoinHandle<()>> {
        inner.epoch = inner.epoch.wrapping_add(1);
        inner.outbound = None;
        inner.driver.take()
    }

    /// Wait out a callback in flight on another thread. The epoch has already
    /// been bumped, so nothing dispatched after this returns reaches a handler.
    fn wait_for_dispatch(&self) {
        if DISPATCHING.with(Cell::get) == self.addr() {
            return;
        }
        drop(self.gate.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Caller holds the `inner` lock.
    fn set_state(&self, next: ConnectionState) {
        self.state_tx.send_if_modified(|s| {
            if *s == next {
                false
            } else {
                *s = next;
                true
            }
        });
    }

    /// Move to `next` unless the driver's epoch went stale.
    fn transition(&self, epoch: u64, next: ConnectionState) -> bool {
        let inner = self.lock();
        if inner.epoch != epoch {
            return false;
        }
        self.set_state(next);
        true
    }

    fn dispatch(&self, epoch: u64, frame: &str) {
        let decoded = codec::decode(frame);
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let handler = {
            let inner = self.lock();
            if inner.epoch != epoch {
                return;
            }
            self.handler.current()
        };
        let _scope = DispatchScope::enter(self);

        match decoded {
            Ok(Envelope::NewMessage { message }) => handler.on_message(&message),
            Ok(Envelope::UserTyping { user_id }) => handler.on_user_typing(&user_id),
            Ok(Envelope::UserJoined { user_id }) => handler.on_user_joined(&user_id),
            Ok(Envelope::UserLeft { user_id }) => handler.on_user_left(&user_id),
            Ok(Envelope::Error { message }) => handler.on_error(&message),
            Ok(Envelope::Pong) => tracing::trace!("pong"),
            Ok(other) => {
                tracing::warn!(kind = other.kind().as_str(), "ignoring client-only envelope from server")
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed frame");
                handler.on_error(DECODE_ERROR_TEXT);
            }
        }
    }
}

fn queue_join(tx: &mpsc::UnboundedSender<String>, group_id: &str) {
    match codec::encode(&Envelope::join(group_id)) {
        Ok(frame) => {
            let _ = tx.send(frame);
        }
        Err(e) => tracing::warn!(error = %e, "join encode failed"),
    }
}

async fn drive(
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    url: String,
    timing: Timing,
    epoch: u64,
) {
    loop {
        if !shared.transition(epoch, ConnectionState::Connecting) {
            return;
        }
        tracing::debug!(%url, "connecting");

        match connector.connect(&url).await {
            Ok(transport) => {
                if let Err(e) = run_open(&shared, epoch, transport, timing.ping_interval).await {
                    tracing::debug!(error = %e, "connection lost");
                }
            }
            Err(e) => tracing::warn!(error = %e, "connect failed"),
        }

        if !shared.transition(epoch, ConnectionState::Closed) {
            return;
        }
        tracing::info!(
            delay_ms = timing.reconnect_delay.as_millis() as u64,
            "connection closed, reconnect scheduled"
        );
        tokio::time::sleep(timing.reconnect_delay).await;
    }
}

async fn run_open(
    shared: &Shared,
    epoch: u64,
    transport: Transport,
    ping_interval: Option<Duration>,
) -> Result<()> {
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    {
        let mut inner = shared.lock();
        if inner.epoch != epoch {
            return Ok(());
        }
        let Some(group) = inner.group.clone() else {
            return Ok(());
        };
        // join is always the first frame on a fresh socket
        queue_join(&tx, &group);
        inner.outbound = Some(tx);
        shared.set_state(ConnectionState::Open);
        tracing::info!(group = %group, "connected");
    }

    let result = pump(shared, epoch, transport, rx, ping_interval).await;

    let mut inner = shared.lock();
    if inner.epoch == epoch {
        inner.outbound = None;
    }
    result
}

async fn pump(
    shared: &Shared,
    epoch: u64,
    transport: Transport,
    mut rx: mpsc::UnboundedReceiver<String>,
    ping_interval: Option<Duration>,
) -> Result<()> {
    let Transport { mut sink, mut stream } = transport;
    let mut ping = ping_interval.map(|every| {
        let mut i = tokio::time::interval_at(Instant::now() + every, every);
        i.set_missed_tick_behavior(MissedTickBehavior::Delay);
        i
    });

    loop {
        tokio::select! {
            out = rx.recv() => {
                let Some(frame) = out else { return Ok(()); };
                sink.send(frame).await?;
            }

            inbound = stream.next() => match inbound {
                Some(Ok(frame)) => shared.dispatch(epoch, &frame),
                Some(Err(e)) => return Err(e),
                None => return Ok(()),
            },

            _ = next_ping(&mut ping) => {
                sink.send(codec::encode(&Envelope::Ping)?).await?;
            }
        }
    }
}

async fn next_ping(ping: &mut Option<Interval>) {
    match ping {
        Some(i) => {
            i.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
