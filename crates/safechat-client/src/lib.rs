//! safechat client: the connection side of the realtime messaging channel.
//!
//! A [`ConnectionManager`] owns one socket per bound group, sends the `join`
//! whenever the socket opens, and reconnects after a fixed delay when it
//! drops. Inbound envelopes are dispatched to a replaceable [`ChatHandler`];
//! wrapping that handler in an [`InvalidationBridge`] keeps a [`QueryCache`]
//! of durable message lists in step with pushed `new_message` events.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod cache;
pub mod config;
pub mod endpoint;
pub mod handler;
pub mod manager;
pub mod transport;

pub use cache::{InvalidationBridge, MessageSource, QueryCache, QueryInvalidator, ResourceKind};
pub use config::ClientConfig;
pub use handler::{ChatHandler, HandlerSlot, NoopHandler};
pub use manager::{ConnectionManager, ConnectionState, DECODE_ERROR_TEXT};
pub use transport::{Connector, Transport, WsConnector};
