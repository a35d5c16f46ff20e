//! Session context types shared across layers.
//!
//! Resolves the connection ticket into an authenticated session before the
//! WebSocket upgrade, so transport code never sees raw credentials.

pub mod session;
