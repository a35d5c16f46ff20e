use std::sync::Arc;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::time::{timeout, Duration};

use safechat_core::error::{Result, SafechatError};

use crate::realtime::core::{Presence, SessionId, SessionRegistry};
use crate::realtime::types::{Outgoing, PreparedMsg, QoS};

/// RealtimeCore: egress engine (send to a session / fan out to a group).
pub struct RealtimeCore {
    pub sessions: Arc<SessionRegistry>,
    pub presence: Arc<Presence>,
}

impl Default for RealtimeCore {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeCore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new()),
            presence: Arc::new(Presence::new()),
        }
    }

    /// Queue an envelope for one session (lossy: dropped if its queue is full).
    pub fn send_to_session(&self, session: SessionId, out: Outgoing) -> Result<()> {
        let conn = self
            .sessions
            .get(session)
            .ok_or_else(|| SafechatError::BadRequest("session not connected".into()))?;
        let prepared = PreparedMsg::prepare(&out)?;
        if conn.tx.try_send(prepared.to_ws_message()).is_err() {
            tracing::debug!(session, "direct send dropped");
        }
        Ok(())
    }

    /// Fan out to every member of `group` except `except`.
    ///
    /// Members are snapshotted once, so a concurrent join/leave can neither
    /// skip nor double-notify anyone within this call. Returns how many
    /// members the frame was handed to.
    pub async fn publish_group(
        &self,
        group: &str,
        except: Option<SessionId>,
        out: Outgoing,
    ) -> Result<usize> {
        let prepared = PreparedMsg::prepare(&out)?;
        let targets: Vec<_> = self
            .presence
            .members(group)
            .into_iter()
            .filter(|s| Some(*s) != except)
            .filter_map(|s| self.sessions.get(s).map(|c| (s, c)))
            .collect();

        match out.qos {
            QoS::Lossy => {
                let mut delivered = 0;
                for (session, conn) in targets {
                    match conn.tx.try_send(prepared.to_ws_message()) {
                        Ok(()) => delivered += 1,
                        Err(_) => tracing::debug!(session, group, "lossy delivery dropped"),
                    }
                }
                Ok(delivered)
            }
            QoS::Reliable { timeout_ms } => {
                let mut futs = FuturesUnordered::new();
                for (session, conn) in targets {
                    let msg = prepared.to_ws_message();
                    futs.push(async move {
                        let sent = if timeout_ms > 0 {
                            matches!(
                                timeout(Duration::from_millis(timeout_ms), conn.tx.send(msg)).await,
                                Ok(Ok(()))
                            )
                        } else {
                            conn.tx.send(msg).await.is_ok()
                        };
                        if !sent {
                            tracing::warn!(session, "reliable delivery failed");
                        }
                        sent
                    });
                }

                let mut delivered = 0;
                while let Some(sent) = futs.next().await {
                    if sent {
                        delivered += 1;
                    }
                }
                Ok(delivered)
            }
        }
    }
}

/// Per-frame context handed to the chat router (borrow tools instead of owning).
#[derive(Clone)]
pub struct RealtimeCtx {
    session: SessionId,
    user: Arc<str>,
    core: Arc<RealtimeCore>,
}

impl RealtimeCtx {
    pub fn new(session: SessionId, user: impl Into<Arc<str>>, core: Arc<RealtimeCore>) -> Self {
        Self {
            session,
            user: user.into(),
            core,
        }
    }

    pub fn session(&self) -> SessionId { self.session }
    pub fn user(&self) -> &str { &self.user }
    pub fn core(&self) -> &RealtimeCore { &self.core }

    /// Group this session is currently joined to.
    pub fn group(&self) -> Option<String> {
        self.core.presence.group_of(self.session)
    }

    /// Returns the previous group if the join moved the session.
    pub fn join_group(&self, group: &str) -> Option<String> {
        self.core.presence.join(group, self.session)
    }

    pub fn leave_group(&self) -> Option<String> {
        self.core.presence.leave(self.session)
    }

    pub fn reply(&self, out: Outgoing) -> Result<()> {
        self.core.send_to_session(self.session, out)
    }

    /// Fan out to the rest of `group`, never echoing to this session.
    pub async fn publish_to_others(&self, group: &str, out: Outgoing) -> Result<usize> {
        self.core.publish_group(group, Some(self.session), out).await
    }
}
