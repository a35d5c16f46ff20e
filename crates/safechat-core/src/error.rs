//! Shared error type across safechat crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed message.
    BadRequest,
    /// Auth failed.
    AuthFailed,
    /// Payload too large.
    PayloadTooLarge,
    /// Not allowed in the current session state.
    NotAllowed,
    /// Unsupported config or protocol version.
    UnsupportedVersion,
    /// The realtime channel is not open.
    NotConnected,
    /// Internal error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and HTTP bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ClientCode::NotAllowed => "NOT_ALLOWED",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::NotConnected => "NOT_CONNECTED",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, SafechatError>;

/// Unified error type used by core, gateway, and client.
#[derive(Debug, Error)]
pub enum SafechatError {
    #[error("bad request: {0}")]
    BadRequest(String),
    /// A frame could not be parsed as an envelope.
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("auth failed")]
    AuthFailed,
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("not allowed: {0}")]
    NotAllowed(String),
    #[error("not connected")]
    NotConnected,
    /// Connect error or abnormal close of the underlying socket.
    #[error("transport: {0}")]
    Transport(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl SafechatError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            SafechatError::BadRequest(_) | SafechatError::Decode(_) => ClientCode::BadRequest,
            SafechatError::AuthFailed => ClientCode::AuthFailed,
            SafechatError::PayloadTooLarge => ClientCode::PayloadTooLarge,
            SafechatError::NotAllowed(_) => ClientCode::NotAllowed,
            SafechatError::NotConnected => ClientCode::NotConnected,
            SafechatError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            SafechatError::Transport(_) | SafechatError::Internal(_) => ClientCode::Internal,
        }
    }
}
