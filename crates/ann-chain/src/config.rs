#![forbid(unsafe_code)]

use std::path::Path;

use ann_crypto::MerkleParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_TX_BYTES: usize = 1024 * 1024; // 1 MiB
pub const DEFAULT_MAX_TXS_PER_BLOCK: usize = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml decode error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("toml encode error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("config invalid: {0}")]
    Invalid(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub merkle: MerkleParams,
    pub policy: TxPolicy,
}

/// Block-level admission rules. None of this changes how a root is hashed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxPolicy {
    pub max_tx_bytes: usize,
    pub max_txs_per_block: usize,
    /// Hash `unwrap_tx(tx)` instead of the raw blob.
    pub unwrap_envelope: bool,
}

impl Default for TxPolicy {
    fn default() -> Self {
        Self {
            max_tx_bytes: DEFAULT_MAX_TX_BYTES,
            max_txs_per_block: DEFAULT_MAX_TXS_PER_BLOCK,
            unwrap_envelope: false,
        }
    }
}

pub fn validate_config(cfg: &ChainConfig) -> Result<()> {
    if cfg.policy.max_tx_bytes == 0 {
        return Err(ConfigError::Invalid("policy.max_tx_bytes must be > 0"));
    }
    if cfg.policy.max_txs_per_block == 0 {
        return Err(ConfigError::Invalid("policy.max_txs_per_block must be > 0"));
    }
    if matches!(cfg.merkle.parallel_threshold, Some(t) if t < 2) {
        return Err(ConfigError::Invalid(
            "merkle.parallel_threshold must be >= 2 when set",
        ));
    }
    Ok(())
}

pub fn save_config_to_path<P: AsRef<Path>>(path: P, cfg: &ChainConfig) -> Result<()> {
    validate_config(cfg)?;
    let s = toml::to_string(cfg)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<ChainConfig> {
    let s = std::fs::read_to_string(path)?;
    let cfg: ChainConfig = toml::from_str(&s)?;
    validate_config(&cfg)?;
    Ok(cfg)
}
