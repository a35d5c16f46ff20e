//! Resolve the realtime endpoint from the HTTP origin.
//!
//! Same host and port as the origin, `wss` when the origin is `https`.

use safechat_core::error::{Result, SafechatError};
use safechat_core::protocol::WS_PATH;

pub fn ws_url(origin: &str, ticket: &str) -> Result<String> {
    let origin = origin.trim().trim_end_matches('/');
    let (scheme, authority) = if let Some(rest) = origin.strip_prefix("https://") {
        ("wss", rest)
    } else if let Some(rest) = origin.strip_prefix("http://") {
        ("ws", rest)
    } else {
        return Err(SafechatError::BadRequest(format!(
            "origin must start with http:// or https://: {origin}"
        )));
    };

    if authority.is_empty() || authority.contains(['/', '?', '#']) {
        return Err(SafechatError::BadRequest(format!(
            "origin must be scheme://host[:port]: {origin}"
        )));
    }
    if ticket.is_empty()
        || !ticket
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | ':'))
    {
        return Err(SafechatError::BadRequest("ticket contains unsupported characters".into()));
    }

    Ok(format!("{scheme}://{authority}{WS_PATH}?ticket={ticket}"))
}
