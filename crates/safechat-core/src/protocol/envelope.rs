//! Wire envelope.
//!
//! Field names follow the established wire contract (`contenido`,
//! `archivoUrl`, `usuarioId`, `mensaje`), so the Rust names are mapped with
//! `serde(rename)` rather than exposed as-is.

use serde::{Deserialize, Serialize};

use crate::message::ChatMessage;

/// One logical message on the realtime channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// Client -> server: bind this connection to a group (last join wins).
    Join {
        #[serde(rename = "groupId")]
        group_id: String,
    },
    /// Client -> server: chat text for the joined group.
    Message {
        #[serde(rename = "contenido")]
        content: String,
        #[serde(
            rename = "archivoUrl",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        attachment_url: Option<String>,
    },
    /// Client -> server: typing indicator. Never persisted.
    Typing,
    /// Client -> server: application keepalive, answered with `pong`.
    Ping,
    /// Server -> client: a message persisted and rebroadcast to the group.
    NewMessage {
        #[serde(rename = "mensaje")]
        message: ChatMessage,
    },
    UserJoined {
        #[serde(rename = "usuarioId")]
        user_id: String,
    },
    UserLeft {
        #[serde(rename = "usuarioId")]
        user_id: String,
    },
    UserTyping {
        #[serde(rename = "usuarioId")]
        user_id: String,
    },
    /// Server -> client: protocol or application error for this connection.
    Error { message: String },
    Pong,
}

/// Discriminant of an [`Envelope`], handy for logs and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    Join,
    Message,
    Typing,
    Ping,
    NewMessage,
    UserJoined,
    UserLeft,
    UserTyping,
    Error,
    Pong,
}

impl EnvelopeKind {
    /// Wire value of the `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeKind::Join => "join",
            EnvelopeKind::Message => "message",
            EnvelopeKind::Typing => "typing",
            EnvelopeKind::Ping => "ping",
            EnvelopeKind::NewMessage => "new_message",
            EnvelopeKind::UserJoined => "user_joined",
            EnvelopeKind::UserLeft => "user_left",
            EnvelopeKind::UserTyping => "user_typing",
            EnvelopeKind::Error => "error",
            EnvelopeKind::Pong => "pong",
        }
    }
}

impl Envelope {
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Envelope::Join { .. } => EnvelopeKind::Join,
            Envelope::Message { .. } => EnvelopeKind::Message,
            Envelope::Typing => EnvelopeKind::Typing,
            Envelope::Ping => EnvelopeKind::Ping,
            Envelope::NewMessage { .. } => EnvelopeKind::NewMessage,
            Envelope::UserJoined { .. } => EnvelopeKind::UserJoined,
            Envelope::UserLeft { .. } => EnvelopeKind::UserLeft,
            Envelope::UserTyping { .. } => EnvelopeKind::UserTyping,
            Envelope::Error { .. } => EnvelopeKind::Error,
            Envelope::Pong => EnvelopeKind::Pong,
        }
    }

    pub fn join(group_id: impl Into<String>) -> Self {
        Envelope::Join {
            group_id: group_id.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Envelope::Error {
            message: message.into(),
        }
    }
}
