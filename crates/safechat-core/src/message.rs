//! Persisted chat message model.
//!
//! This is the shape the durable store hands back and the shape embedded in
//! `new_message` envelopes (`mensaje`).

use serde::{Deserialize, Serialize};

/// A message as stored durably.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Store-assigned identity. The UI deduplicates push and refetch by this.
    pub id: u64,
    pub group_id: String,
    pub sender_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: u64,
}

/// A message before the store assigned it an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    pub group_id: String,
    pub sender_id: String,
    pub content: String,
    pub attachment_url: Option<String>,
}

impl NewChatMessage {
    pub fn into_message(self, id: u64, created_at: u64) -> ChatMessage {
        ChatMessage {
            id,
            group_id: self.group_id,
            sender_id: self.sender_id,
            content: self.content,
            attachment_url: self.attachment_url,
            created_at,
        }
    }
}
