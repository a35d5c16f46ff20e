use axum::extract::ws::Message;

use safechat_core::error::Result;
use safechat_core::protocol::{codec, Envelope};

/// Quality-of-Service strategy for outgoing delivery.
#[derive(Debug, Clone, Default)]
pub enum QoS {
    /// Latency-critical: do not await; if the member's queue is full, drop.
    #[default]
    Lossy,
    /// Reliability-critical: await queue space, bounded by `timeout_ms` (0 = unbounded).
    Reliable { timeout_ms: u64 },
}

/// Application-level outgoing envelope.
#[derive(Debug, Clone)]
pub struct Outgoing {
    pub qos: QoS,
    pub envelope: Envelope,
}

impl Outgoing {
    pub fn lossy(envelope: Envelope) -> Self {
        Self {
            qos: QoS::Lossy,
            envelope,
        }
    }

    pub fn reliable(envelope: Envelope, timeout_ms: u64) -> Self {
        Self {
            qos: QoS::Reliable { timeout_ms },
            envelope,
        }
    }
}

/// Prepared frame cached for broadcasting (serialize once, send N times).
#[derive(Debug, Clone)]
pub struct PreparedMsg(String);

impl PreparedMsg {
    pub fn prepare(out: &Outgoing) -> Result<Self> {
        codec::encode(&out.envelope).map(PreparedMsg)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to axum::ws::Message for transport.
    pub fn to_ws_message(&self) -> Message {
        Message::Text(self.0.clone())
    }
}
