#![forbid(unsafe_code)]

use ann_crypto::merkle_root_with;
use ann_types::{unwrap_tx, Block, BlockHeader, Hash256, Height, Txs};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ChainConfig;

#[derive(Debug, Error)]
pub enum BlockBuildError {
    #[error("too many txs: {count} > {max}")]
    TooManyTxs { count: usize, max: usize },

    #[error("tx at index {index} too large: {size} > {max} bytes")]
    TxTooLarge { index: usize, size: usize, max: usize },

    #[error("txs root mismatch: expected {expected}, got {got}")]
    TxsRootMismatch { expected: Hash256, got: Hash256 },
}

pub type Result<T> = std::result::Result<T, BlockBuildError>;

fn check_policy(txs: &Txs, cfg: &ChainConfig) -> Result<()> {
    let policy = &cfg.policy;
    if txs.len() > policy.max_txs_per_block {
        return Err(BlockBuildError::TooManyTxs {
            count: txs.len(),
            max: policy.max_txs_per_block,
        });
    }
    for (index, tx) in txs.iter().enumerate() {
        if tx.len() > policy.max_tx_bytes {
            return Err(BlockBuildError::TxTooLarge {
                index,
                size: tx.len(),
                max: policy.max_tx_bytes,
            });
        }
    }
    Ok(())
}

/// Root committed in `BlockHeader::txs_root`, after the size policy passes.
pub fn compute_txs_root(txs: &Txs, cfg: &ChainConfig) -> Result<Hash256> {
    if let Err(e) = check_policy(txs, cfg) {
        warn!(count = txs.len(), "tx list rejected: {e}");
        return Err(e);
    }

    let root = if cfg.policy.unwrap_envelope {
        let bodies: Vec<&[u8]> = txs.iter().map(|t| unwrap_tx(t.as_bytes())).collect();
        merkle_root_with(&bodies, &cfg.merkle)
    } else {
        merkle_root_with(txs.as_slice(), &cfg.merkle)
    };

    debug!(count = txs.len(), root = %root, "computed txs root");
    Ok(root)
}

pub fn build_block(height: Height, txs: Txs, cfg: &ChainConfig) -> Result<Block> {
    let txs_root = compute_txs_root(&txs, cfg)?;
    Ok(Block {
        header: BlockHeader { height, txs_root },
        txs,
    })
}

/// Err(TxsRootMismatch) means the block must be rejected.
pub fn verify_block_txs_root(block: &Block, cfg: &ChainConfig) -> Result<()> {
    let expected = compute_txs_root(&block.txs, cfg)?;
    if block.header.txs_root != expected {
        warn!(
            height = block.header.height.0,
            expected = %expected,
            got = %block.header.txs_root,
            "txs root mismatch"
        );
        return Err(BlockBuildError::TxsRootMismatch {
            expected,
            got: block.header.txs_root,
        });
    }
    Ok(())
}

pub fn txs_root_matches(block: &Block, cfg: &ChainConfig) -> bool {
    verify_block_txs_root(block, cfg).is_ok()
}
