#![forbid(unsafe_code)]

use ann_types::{Hash256, Txs, EMPTY_DIGEST};
use serde::{Deserialize, Serialize};

use crate::{combine, hash_tx};

/// Ranges shorter than this are always leaves or a single combine.
const MIN_PARALLEL_THRESHOLD: usize = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleParams {
    /// Ranges with at least this many txs hash their halves in parallel.
    /// `None` keeps everything on the calling thread.
    pub parallel_threshold: Option<usize>,
}

impl MerkleParams {
    pub fn sequential() -> Self {
        Self {
            parallel_threshold: None,
        }
    }

    pub fn parallel(threshold: usize) -> Self {
        Self {
            parallel_threshold: Some(threshold),
        }
    }
}

/// Merkle root over an ordered tx list.
/// - empty => EMPTY_DIGEST (zero)
/// - one tx => its leaf hash, no combine
/// - otherwise left half takes ceil(n/2), re-split at every level
pub fn merkle_root<T: AsRef<[u8]>>(txs: &[T]) -> Hash256 {
    if txs.is_empty() {
        return EMPTY_DIGEST;
    }
    root_range(txs, 0, txs.len())
}

/// Same root as [`merkle_root`], halves of large ranges hashed via `rayon::join`.
pub fn merkle_root_par<T: AsRef<[u8]> + Sync>(txs: &[T], threshold: usize) -> Hash256 {
    if txs.is_empty() {
        return EMPTY_DIGEST;
    }
    let threshold = threshold.max(MIN_PARALLEL_THRESHOLD);
    root_range_par(txs, 0, txs.len(), threshold)
}

pub fn merkle_root_with<T: AsRef<[u8]> + Sync>(txs: &[T], params: &MerkleParams) -> Hash256 {
    match params.parallel_threshold {
        Some(threshold) => merkle_root_par(txs, threshold),
        None => merkle_root(txs),
    }
}

pub fn txs_root(txs: &Txs) -> Hash256 {
    merkle_root(txs.as_slice())
}

/// Recompute and compare byte-for-byte.
pub fn verify_root<T: AsRef<[u8]>>(txs: &[T], expected: &Hash256) -> bool {
    merkle_root(txs) == *expected
}

#[inline]
fn split_point(start: usize, end: usize) -> usize {
    start + (end - start + 1) / 2
}

// invariant: start < end
fn root_range<T: AsRef<[u8]>>(txs: &[T], start: usize, end: usize) -> Hash256 {
    if end - start == 1 {
        return hash_tx(txs[start].as_ref());
    }
    let mid = split_point(start, end);
    let left = root_range(txs, start, mid);
    let right = root_range(txs, mid, end);
    combine(&left, &right)
}

fn root_range_par<T: AsRef<[u8]> + Sync>(
    txs: &[T],
    start: usize,
    end: usize,
    threshold: usize,
) -> Hash256 {
    if end - start < threshold {
        return root_range(txs, start, end);
    }
    let mid = split_point(start, end);
    let (left, right) = rayon::join(
        || root_range_par(txs, start, mid, threshold),
        || root_range_par(txs, mid, end, threshold),
    );
    combine(&left, &right)
}
