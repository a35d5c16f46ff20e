//! safechat gateway library entry.
//!
//! This crate wires the transport, realtime core, chat router, and durable
//! store into the server half of the realtime messaging channel. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod context;
pub mod ops;
pub mod realtime;
pub mod router;
pub mod services;
pub mod store;
pub mod transport;
