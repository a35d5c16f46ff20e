//! Decode-once codec for the transport layer.
//!
//! - Text frames => Envelope (one JSON object per frame)
//! - Binary frames => rejected, the channel is text-only
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use safechat_core::{
    error::{Result, SafechatError},
    protocol::{codec, Envelope},
};

#[derive(Debug)]
pub enum Inbound {
    Envelope { env: Envelope, bytes_len: usize },
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => {
            let bytes_len = s.len();
            let env = codec::decode(&s)?;
            Ok(Inbound::Envelope { env, bytes_len })
        }
        Message::Binary(_) => Err(SafechatError::BadRequest("binary frames are not supported".into())),
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(v) => Ok(Inbound::Pong(v)),
        Message::Close(_) => Ok(Inbound::Close),
    }
}

/// Cheap frame length, checked before any parsing.
pub fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) => v.len(),
        Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}
