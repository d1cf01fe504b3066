#![forbid(unsafe_code)]

pub mod block_builder;
pub mod config;

pub use block_builder::{
    build_block, compute_txs_root, txs_root_matches, verify_block_txs_root, BlockBuildError,
};
pub use config::{load_config_from_path, save_config_to_path, validate_config, ChainConfig, TxPolicy};
