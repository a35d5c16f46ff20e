//! Realtime channel protocol.
//!
//! - `envelope`: the typed unit exchanged over the socket.
//! - `codec`: one text frame <-> one envelope (JSON object per frame).
//!
//! Decoding is panic-free: malformed input is reported as
//! `SafechatError::Decode` so a single bad frame never takes a connection down.

pub mod codec;
pub mod envelope;

/// Well-known WebSocket path, served on the same host/port as the HTTP origin.
pub const WS_PATH: &str = "/v1/ws";

pub use codec::{decode, encode};
pub use envelope::{Envelope, EnvelopeKind};
