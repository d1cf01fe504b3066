#![forbid(unsafe_code)]

use std::path::Path;

use ann_chain::{compute_txs_root, BlockBuildError, ChainConfig};
use ann_types::canonical::{decode_txs, CanonicalError};
use ann_types::{Hash256, Tx, Txs};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info};

/// Marks an empty transaction in the hex file format.
pub const EMPTY_TX_MARKER: &str = "-";

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad hex on line {line}: {source}")]
    Hex {
        line: usize,
        #[source]
        source: hex::FromHexError,
    },

    #[error("canonical: {0}")]
    Canonical(#[from] CanonicalError),

    #[error("chain: {0}")]
    Chain(#[from] BlockBuildError),

    #[error("config: {0}")]
    Config(#[from] ann_chain::config::ConfigError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NodeError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TxFileFormat {
    /// One hex-encoded tx per line.
    #[default]
    Hex,
    /// `canonical::encode_txs` output.
    Canonical,
}

fn serialize_hex<S: Serializer>(h: &Hash256, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&h.to_hex())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RootReport {
    #[serde(serialize_with = "serialize_hex")]
    pub txs_root: Hash256,
    pub count: usize,
}

impl RootReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Blank lines and `#` comments are skipped; `-` is an empty tx.
pub fn parse_hex_txs(text: &str) -> Result<Txs> {
    let mut txs = Txs::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == EMPTY_TX_MARKER {
            txs.push(Tx::default());
            continue;
        }
        let digits = line
            .strip_prefix("0x")
            .or_else(|| line.strip_prefix("0X"))
            .unwrap_or(line);
        let bytes = hex::decode(digits).map_err(|source| NodeError::Hex { line: i + 1, source })?;
        txs.push(Tx(bytes));
    }
    Ok(txs)
}

pub fn read_txs_file<P: AsRef<Path>>(path: P, format: TxFileFormat) -> Result<Txs> {
    let path = path.as_ref();
    let txs = match format {
        TxFileFormat::Hex => parse_hex_txs(&std::fs::read_to_string(path)?)?,
        TxFileFormat::Canonical => decode_txs(&std::fs::read(path)?)?,
    };
    debug!(path = %path.display(), count = txs.len(), "read tx file");
    Ok(txs)
}

pub fn compute_root<P: AsRef<Path>>(
    path: P,
    format: TxFileFormat,
    cfg: &ChainConfig,
) -> Result<RootReport> {
    let txs = read_txs_file(path, format)?;
    let txs_root = compute_txs_root(&txs, cfg)?;
    info!(count = txs.len(), root = %txs_root, "txs root");
    Ok(RootReport {
        txs_root,
        count: txs.len(),
    })
}

pub fn verify_root_file<P: AsRef<Path>>(
    path: P,
    format: TxFileFormat,
    expected: &Hash256,
    cfg: &ChainConfig,
) -> Result<bool> {
    let report = compute_root(path, format, cfg)?;
    Ok(report.txs_root == *expected)
}

pub fn load_config(path: Option<&Path>) -> Result<ChainConfig> {
    match path {
        Some(p) => Ok(ann_chain::load_config_from_path(p)?),
        None => Ok(ChainConfig::default()),
    }
}
