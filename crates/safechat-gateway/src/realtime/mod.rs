//! Realtime runtime (egress engine) for the safechat gateway.
//!
//! SessionRegistry + Presence + QoS-based group fan-out.

pub mod core;
pub mod types;

pub use core::{Connection, Presence, RealtimeCore, RealtimeCtx, SessionId, SessionRegistry};
pub use types::{Outgoing, PreparedMsg, QoS};
