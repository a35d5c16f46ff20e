//! Built-in realtime services.
//!
//! `chat` is the group fan-out router: it interprets client envelopes,
//! persists messages, and rebroadcasts to the rest of the group.

pub mod chat;

pub use chat::ChatRouter;
