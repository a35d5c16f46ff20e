//! safechat core: wire envelopes, the message framer, and the shared error type.
//!
//! This crate defines the contract spoken between the gateway and its clients
//! over the realtime channel. It carries no transport or runtime dependencies
//! so both sides (and tests) can link it without pulling in a server stack.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed frames surface as `SafechatError::Decode`, never as a panic.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod message;
pub mod protocol;

/// Shared result type.
pub use error::{Result, SafechatError};
