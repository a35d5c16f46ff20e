//! Shared application state for the safechat gateway.
//!
//! Wires config, the realtime core, the durable store, and the chat router.
//! Startup errors are explicit (Result instead of panic).

use std::sync::Arc;

use safechat_core::error::{Result, SafechatError};

use crate::config::GatewayConfig;
use crate::realtime::RealtimeCore;
use crate::services::ChatRouter;
use crate::store::{MemoryStore, MessageStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    realtime: Arc<RealtimeCore>,
    chat: Arc<ChatRouter>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    store: Arc<dyn MessageStore>,
}

impl AppState {
    /// Build application state backed by the in-memory store.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        Self::with_store(cfg, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(cfg: GatewayConfig, store: Arc<dyn MessageStore>) -> Result<Self> {
        cfg.validate()?;

        let realtime = Arc::new(RealtimeCore::new());
        let chat = ChatRouter::new(Arc::clone(&store), cfg.limits.max_content_chars);

        tracing::info!(
            tickets = cfg.auth.tickets.len(),
            max_frame_bytes = cfg.limits.max_frame_bytes,
            "gateway state ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, store }),
            realtime,
            chat: Arc::new(chat),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> Arc<dyn MessageStore> {
        Arc::clone(&self.inner.store)
    }

    /// Map a connection ticket to the user it authenticates.
    pub fn resolve_ticket(&self, ticket: &str) -> Result<String> {
        self.inner
            .cfg
            .auth
            .tickets
            .get(ticket)
            .cloned()
            .ok_or(SafechatError::AuthFailed)
    }

    pub fn realtime(&self) -> Arc<RealtimeCore> {
        Arc::clone(&self.realtime)
    }

    pub fn chat(&self) -> Arc<ChatRouter> {
        Arc::clone(&self.chat)
    }
}
