//! Ledger config loader (strict parsing).

pub mod schema;

use std::fs;

use bwledger_core::error::{LedgerError, Result};

pub use schema::{GatewaySection, LedgerConfig, UserSeed};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "BWLEDGER_CONFIG";
/// Fallback when `BWLEDGER_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "bwledger.yaml";

pub fn load_from_file(path: &str) -> Result<LedgerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| LedgerError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<LedgerConfig> {
    let cfg: LedgerConfig = serde_yaml::from_str(s)
        .map_err(|e| LedgerError::InvalidArgument(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the config path from the environment.
pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
