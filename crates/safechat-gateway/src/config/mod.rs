//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use safechat_core::error::{Result, SafechatError};

pub use schema::{AuthSection, GatewayConfig, GatewaySection, Limits};

/// Environment variable naming the config file; falls back to `safechat.yaml`.
pub const CONFIG_PATH_ENV: &str = "SAFECHAT_CONFIG";

pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "safechat.yaml".to_string())
}

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| SafechatError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| SafechatError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
