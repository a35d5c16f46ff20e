//! Message framer: one JSON object per transport text frame.
//!
//! Parsing rules:
//! - No length prefixing; the transport's framing delimits envelopes.
//! - Never `unwrap()` / `expect()` / `panic!()` on input-derived data.

use crate::error::{Result, SafechatError};
use crate::protocol::envelope::Envelope;

/// Encode an envelope into a single text frame. Absent optional fields are omitted.
pub fn encode(env: &Envelope) -> Result<String> {
    serde_json::to_string(env)
        .map_err(|e| SafechatError::Internal(format!("envelope encode failed: {e}")))
}

/// Decode a text frame. Anything that is not a recognized envelope is a `Decode` error.
pub fn decode(frame: &str) -> Result<Envelope> {
    serde_json::from_str(frame).map_err(|e| {
        tracing::debug!(error = %e, len = frame.len(), "envelope decode failed");
        SafechatError::Decode(e.to_string())
    })
}
