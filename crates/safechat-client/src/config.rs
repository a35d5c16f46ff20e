//! Client configuration.

use std::time::Duration;

use serde::Deserialize;
use safechat_core::error::{Result, SafechatError};

use crate::endpoint;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// HTTP origin the page was loaded from, e.g. `https://portal.example`.
    pub origin: String,

    /// Connection ticket passed on upgrade.
    pub ticket: String,

    /// Fixed delay between a close and the next connection attempt.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Application-level `ping` interval. `None` relies on transport pings.
    #[serde(default)]
    pub ping_interval_ms: Option<u64>,
}

impl ClientConfig {
    pub fn new(origin: impl Into<String>, ticket: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ticket: ticket.into(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            ping_interval_ms: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.reconnect_delay_ms == 0 {
            return Err(SafechatError::BadRequest(
                "reconnect_delay_ms must be positive".into(),
            ));
        }
        if matches!(self.ping_interval_ms, Some(ms) if ms < 1000) {
            return Err(SafechatError::BadRequest(
                "ping_interval_ms must be at least 1000".into(),
            ));
        }
        self.ws_url().map(|_| ())
    }

    pub fn ws_url(&self) -> Result<String> {
        endpoint::ws_url(&self.origin, &self.ticket)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn ping_interval(&self) -> Option<Duration> {
        self.ping_interval_ms.map(Duration::from_millis)
    }
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}
