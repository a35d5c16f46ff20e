//! Inbound event callbacks and the slot they are resolved through.

use std::sync::{Arc, PoisonError, RwLock};

use safechat_core::message::ChatMessage;

/// Callbacks fired once per inbound envelope, in arrival order.
///
/// Every method defaults to a no-op so handlers only implement what they use.
pub trait ChatHandler: Send + Sync {
    fn on_message(&self, _message: &ChatMessage) {}
    fn on_user_typing(&self, _user_id: &str) {}
    fn on_error(&self, _error_text: &str) {}
    fn on_user_joined(&self, _user_id: &str) {}
    fn on_user_left(&self, _user_id: &str) {}
}

pub struct NoopHandler;

impl ChatHandler for NoopHandler {}

/// Updatable indirection to the current handler.
///
/// The connection driver never captures a handler; it asks the slot at
/// dispatch time, so replacing the handler never forces a reconnect.
#[derive(Clone)]
pub struct HandlerSlot(Arc<RwLock<Arc<dyn ChatHandler>>>);

impl HandlerSlot {
    pub fn new(handler: Arc<dyn ChatHandler>) -> Self {
        Self(Arc::new(RwLock::new(handler)))
    }

    pub fn set(&self, handler: Arc<dyn ChatHandler>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = handler;
    }

    /// Clone out the current handler; the lock is not held while it runs.
    pub fn current(&self) -> Arc<dyn ChatHandler> {
        Arc::clone(&self.0.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Default for HandlerSlot {
    fn default() -> Self {
        Self::new(Arc::new(NoopHandler))
    }
}
