use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;

use super::SessionId;

/// One session's outbound queue sender plus the user it authenticated as.
#[derive(Clone)]
pub struct Connection {
    pub user_id: Arc<str>,
    pub tx: mpsc::Sender<Message>,
}

/// Session registry: `session id -> Connection`.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Connection>,
    seq: AtomicU64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Allocate a process-unique session id.
    pub fn next_id(&self) -> SessionId {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    pub fn insert(&self, session: SessionId, conn: Connection) {
        self.sessions.insert(session, conn);
    }

    pub fn remove(&self, session: SessionId) -> Option<Connection> {
        self.sessions.remove(&session).map(|(_, conn)| conn)
    }

    pub fn get(&self, session: SessionId) -> Option<Connection> {
        self.sessions.get(&session).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
