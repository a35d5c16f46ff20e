use std::collections::HashMap;

use serde::Deserialize;
use safechat_core::error::{Result, SafechatError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub limits: Limits,

    pub auth: AuthSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(SafechatError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.limits.validate()?;
        self.auth.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(SafechatError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(SafechatError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(SafechatError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}

/// Per-connection payload limits.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Limits {
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// How many messages the history route returns per group.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_frame_bytes: default_max_frame_bytes(),
            max_content_chars: default_max_content_chars(),
            history_limit: default_history_limit(),
        }
    }
}

impl Limits {
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_bytes < 128 {
            return Err(SafechatError::BadRequest(
                "limits.max_frame_bytes must be at least 128".into(),
            ));
        }
        if self.max_content_chars == 0 {
            return Err(SafechatError::BadRequest(
                "limits.max_content_chars must be positive".into(),
            ));
        }
        if !(1..=1000).contains(&self.history_limit) {
            return Err(SafechatError::BadRequest(
                "limits.history_limit must be between 1 and 1000".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_frame_bytes() -> usize {
    8192
}
fn default_max_content_chars() -> usize {
    2000
}
fn default_history_limit() -> usize {
    100
}

/// Connection tickets accepted on upgrade, mapped to the user they authenticate.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    pub tickets: HashMap<String, String>,
}

impl AuthSection {
    pub fn validate(&self) -> Result<()> {
        if self.tickets.is_empty() {
            return Err(SafechatError::BadRequest("auth.tickets must not be empty".into()));
        }
        if self.tickets.values().any(|user| user.trim().is_empty()) {
            return Err(SafechatError::BadRequest(
                "auth.tickets must map to non-empty user ids".into(),
            ));
        }
        Ok(())
    }
}
