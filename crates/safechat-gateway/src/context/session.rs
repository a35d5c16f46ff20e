use safechat_core::error::{Result, SafechatError};

use crate::app_state::AppState;
use crate::realtime::SessionId;

/// Immutable metadata for a connected session (user/sid).
#[derive(Debug, Clone)]
pub struct SessionMeta {
    /// User the ticket authenticated as. Becomes `senderId` / `usuarioId`.
    pub user_id: String,
    /// Session identifier (per-connection).
    pub session_id: SessionId,
}

impl SessionMeta {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }
}

/// Resolve a connection ticket or return a client-visible error.
pub fn resolve_session(state: &AppState, ticket: &str) -> Result<SessionMeta> {
    if ticket.is_empty() {
        return Err(SafechatError::AuthFailed);
    }
    let user_id = state.resolve_ticket(ticket)?;
    Ok(SessionMeta {
        user_id,
        session_id: state.realtime().sessions.next_id(),
    })
}
