use std::sync::Arc;

use safechat_core::error::{Result, SafechatError};
use safechat_core::message::NewChatMessage;
use safechat_core::protocol::Envelope;

use crate::realtime::{Outgoing, RealtimeCtx};
use crate::store::MessageStore;

/// Upper bound on how long one member may stall a reliable broadcast.
const RELIABLE_TIMEOUT_MS: u64 = 1500;

/// Group fan-out router.
///
/// - `join`: (re)associate the session with a group, announce it.
/// - `message`: persist, then `new_message` to the rest of the group.
/// - `typing`: `user_typing` to the rest of the group, never persisted.
/// - `ping`: `pong` to the sender.
///
/// Errors returned from `handle` are protocol violations; the transport
/// reports them to the sender as `error` envelopes and keeps the socket open.
pub struct ChatRouter {
    store: Arc<dyn MessageStore>,
    max_content_chars: usize,
}

impl ChatRouter {
    pub fn new(store: Arc<dyn MessageStore>, max_content_chars: usize) -> Self {
        Self {
            store,
            max_content_chars,
        }
    }

    pub async fn handle(&self, ctx: &RealtimeCtx, env: Envelope) -> Result<()> {
        match env {
            Envelope::Join { group_id } => self.join(ctx, group_id.trim()).await,
            Envelope::Message {
                content,
                attachment_url,
            } => self.message(ctx, content, attachment_url).await,
            Envelope::Typing => {
                let group = require_group(ctx)?;
                let out = Outgoing::lossy(Envelope::UserTyping {
                    user_id: ctx.user().to_string(),
                });
                ctx.publish_to_others(&group, out).await?;
                Ok(())
            }
            Envelope::Ping => ctx.reply(Outgoing::lossy(Envelope::Pong)),
            other => Err(SafechatError::BadRequest(format!(
                "unsupported message type: {}",
                other.kind().as_str()
            ))),
        }
    }

    /// Announce the departure to whatever group the session was in.
    pub async fn on_disconnect(&self, ctx: &RealtimeCtx) {
        let Some(group) = ctx.leave_group() else {
            return;
        };
        let out = Outgoing::reliable(
            Envelope::UserLeft {
                user_id: ctx.user().to_string(),
            },
            RELIABLE_TIMEOUT_MS,
        );
        if let Err(e) = ctx.core().publish_group(&group, None, out).await {
            tracing::warn!(group = %group, error = %e, "user_left broadcast failed");
        }
    }

    async fn join(&self, ctx: &RealtimeCtx, group: &str) -> Result<()> {
        if group.is_empty() {
            return Err(SafechatError::BadRequest("join requires a non-empty groupId".into()));
        }
        if ctx.group().as_deref() == Some(group) {
            return Ok(());
        }

        let user = ctx.user().to_string();
        if let Some(old) = ctx.join_group(group) {
            let out = Outgoing::reliable(Envelope::UserLeft { user_id: user.clone() }, RELIABLE_TIMEOUT_MS);
            ctx.publish_to_others(&old, out).await?;
        }
        tracing::info!(group, "joined");

        let out = Outgoing::reliable(Envelope::UserJoined { user_id: user }, RELIABLE_TIMEOUT_MS);
        ctx.publish_to_others(group, out).await?;
        Ok(())
    }

    async fn message(
        &self,
        ctx: &RealtimeCtx,
        content: String,
        attachment_url: Option<String>,
    ) -> Result<()> {
        let group = require_group(ctx)?;

        let attachment_url = attachment_url.filter(|u| !u.trim().is_empty());
        if content.trim().is_empty() && attachment_url.is_none() {
            return Err(SafechatError::BadRequest("message requires contenido or archivoUrl".into()));
        }
        if content.chars().count() > self.max_content_chars {
            return Err(SafechatError::PayloadTooLarge);
        }

        let stored = self
            .store
            .append(NewChatMessage {
                group_id: group.clone(),
                sender_id: ctx.user().to_string(),
                content,
                attachment_url,
            })
            .await?;
        tracing::debug!(group = %group, id = stored.id, "message persisted");

        let out = Outgoing::reliable(Envelope::NewMessage { message: stored }, RELIABLE_TIMEOUT_MS);
        ctx.publish_to_others(&group, out).await?;
        Ok(())
    }
}

fn require_group(ctx: &RealtimeCtx) -> Result<String> {
    ctx.group()
        .ok_or_else(|| SafechatError::NotAllowed("join a group before sending messages".into()))
}
