//! Durable message storage boundary.
//!
//! The chat router persists every `message` through this trait before
//! fanning it out; the history route reads it back so clients can refetch
//! after a cache invalidation.

mod memory;

use async_trait::async_trait;

use safechat_core::error::Result;
use safechat_core::message::{ChatMessage, NewChatMessage};

pub use memory::MemoryStore;

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message, assigning its id and creation time.
    async fn append(&self, msg: NewChatMessage) -> Result<ChatMessage>;

    /// Latest `limit` messages of a group, oldest first.
    async fn list(&self, group_id: &str, limit: usize) -> Result<Vec<ChatMessage>>;
}
