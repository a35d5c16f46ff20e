//! Cache invalidation bridge.
//!
//! Pushed `new_message` events do not patch cached lists; they mark the
//! group's durable read stale so the next read refetches from the store. A
//! message can therefore show up twice (push, then refetch); reconciling by
//! `ChatMessage::id` is the UI's job.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use safechat_core::error::Result;
use safechat_core::message::ChatMessage;

use crate::handler::ChatHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Messages,
}

/// Keyed invalidation call, `(resource kind, group id)`.
pub trait QueryInvalidator: Send + Sync {
    fn invalidate(&self, kind: ResourceKind, group_id: &str);
}

/// Durable read path for a group's messages.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn fetch_messages(&self, group_id: &str) -> Result<Vec<ChatMessage>>;
}

type Key = (ResourceKind, String);

struct Entry {
    messages: Arc<Vec<ChatMessage>>,
    stale: bool,
}

/// Query cache of message lists per group.
#[derive(Default)]
pub struct QueryCache {
    entries: DashMap<Key, Entry>,
    /// Bumped on every invalidation; a fetch that raced one is stored stale.
    generations: DashMap<Key, u64>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached list if fresh, otherwise refetch through `source`.
    pub async fn messages(
        &self,
        group_id: &str,
        source: &dyn MessageSource,
    ) -> Result<Arc<Vec<ChatMessage>>> {
        let key = (ResourceKind::Messages, group_id.to_string());
        if let Some(entry) = self.entries.get(&key) {
            if !entry.stale {
                return Ok(Arc::clone(&entry.messages));
            }
        }

        let generation = self.generation(&key);
        let messages = Arc::new(source.fetch_messages(group_id).await?);
        let stale = self.generation(&key) != generation;
        tracing::debug!(group = group_id, count = messages.len(), stale, "messages refetched");

        self.entries.insert(
            key,
            Entry {
                messages: Arc::clone(&messages),
                stale,
            },
        );
        Ok(messages)
    }

    /// Missing entries count as stale.
    pub fn is_stale(&self, kind: ResourceKind, group_id: &str) -> bool {
        self.entries
            .get(&(kind, group_id.to_string()))
            .map(|e| e.stale)
            .unwrap_or(true)
    }

    fn generation(&self, key: &Key) -> u64 {
        self.generations.get(key).map(|g| *g).unwrap_or(0)
    }
}

impl QueryInvalidator for QueryCache {
    fn invalidate(&self, kind: ResourceKind, group_id: &str) {
        let key = (kind, group_id.to_string());
        *self.generations.entry(key.clone()).or_insert(0) += 1;
        if let Some(mut entry) = self.entries.get_mut(&key) {
            entry.stale = true;
        }
    }
}

/// Handler wrapper that invalidates `(Messages, group)` on every pushed message
/// before delegating. All other callbacks pass straight through.
pub struct InvalidationBridge<H> {
    invalidator: Arc<dyn QueryInvalidator>,
    inner: H,
}

impl<H: ChatHandler> InvalidationBridge<H> {
    pub fn new(invalidator: Arc<dyn QueryInvalidator>, inner: H) -> Self {
        Self { invalidator, inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: ChatHandler> ChatHandler for InvalidationBridge<H> {
    fn on_message(&self, message: &ChatMessage) {
        self.invalidator
            .invalidate(ResourceKind::Messages, &message.group_id);
        self.inner.on_message(message);
    }

    fn on_user_typing(&self, user_id: &str) {
        self.inner.on_user_typing(user_id);
    }

    fn on_error(&self, error_text: &str) {
        self.inner.on_error(error_text);
    }

    fn on_user_joined(&self, user_id: &str) {
        self.inner.on_user_joined(user_id);
    }

    fn on_user_left(&self, user_id: &str) {
        self.inner.on_user_left(user_id);
    }
}
