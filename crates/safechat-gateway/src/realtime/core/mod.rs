//! Realtime core components for the gateway runtime.
//!
//! Session registry, group presence, and the egress runtime/context shared
//! with the chat router.

mod presence;
mod realtime;
mod session_registry;

/// Process-unique id of one WebSocket session.
pub type SessionId = u64;

pub use presence::Presence;
pub use realtime::{RealtimeCore, RealtimeCtx};
pub use session_registry::{Connection, SessionRegistry};
