use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dashmap::DashMap;

use safechat_core::error::Result;
use safechat_core::message::{ChatMessage, NewChatMessage};

use super::MessageStore;

/// In-process store, one append-only log per group.
pub struct MemoryStore {
    groups: DashMap<String, Vec<ChatMessage>>,
    seq: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            groups: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, msg: NewChatMessage) -> Result<ChatMessage> {
        let id = self.seq.fetch_add(1, Ordering::Relaxed);
        let stored = msg.into_message(id, now_ms());
        self.groups
            .entry(stored.group_id.clone())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, group_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        let Some(log) = self.groups.get(group_id) else {
            return Ok(Vec::new());
        };
        let start = log.len().saturating_sub(limit);
        Ok(log[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn new_msg(group: &str, content: &str) -> NewChatMessage {
        NewChatMessage {
            group_id: group.into(),
            sender_id: "user:a".into(),
            content: content.into(),
            attachment_url: None,
        }
    }

    #[tokio::test]
    async fn list_returns_latest_oldest_first() {
        let store = MemoryStore::new();
        for c in ["uno", "dos", "tres"] {
            store.append(new_msg("g1", c)).await.unwrap();
        }
        store.append(new_msg("g2", "otro")).await.unwrap();

        let got = store.list("g1", 2).await.unwrap();
        let contents: Vec<_> = got.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["dos", "tres"]);
        assert!(got[0].id < got[1].id);
        assert!(store.list("nope", 10).await.unwrap().is_empty());
    }
}
