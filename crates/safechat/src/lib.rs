//! Top-level facade crate for safechat.
//!
//! Re-exports the shared protocol types, the gateway library, and the client
//! so users can depend on a single crate.

pub mod core {
    pub use safechat_core::*;
}

pub mod gateway {
    pub use safechat_gateway::*;
}

pub mod client {
    pub use safechat_client::*;
}
