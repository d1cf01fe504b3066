#![forbid(unsafe_code)]

use ann_types::{Hash256, Tx};
use tiny_keccak::{Hasher, Keccak};

pub mod merkle;

pub use merkle::{merkle_root, merkle_root_par, merkle_root_with, txs_root, verify_root, MerkleParams};

/// Keccak-256 (the Ethereum padding, not SHA3-256).
pub fn keccak256(bytes: &[u8]) -> Hash256 {
    let mut hasher = Keccak::v256();
    hasher.update(bytes);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    Hash256(out)
}

/// Leaf hash of one transaction. Doubles as the transaction id.
pub fn hash_tx(tx: &[u8]) -> Hash256 {
    keccak256(tx)
}

pub fn tx_id(tx: &Tx) -> Hash256 {
    hash_tx(tx.as_bytes())
}

/// Parent digest: H(left || right). Argument order matters.
pub fn combine(left: &Hash256, right: &Hash256) -> Hash256 {
    let mut hasher = Keccak::v256();
    hasher.update(&left.0);
    hasher.update(&right.0);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    Hash256(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_empty_vector() {
        let h = keccak256(&[]);
        assert_eq!(
            h.to_hex(),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn hash_tx_is_deterministic() {
        assert_eq!(hash_tx(b"tx-1"), hash_tx(b"tx-1"));
        assert_ne!(hash_tx(b"tx-1"), hash_tx(b"tx-2"));
    }

    #[test]
    fn tx_id_matches_leaf_hash() {
        let tx = Tx(b"payload".to_vec());
        assert_eq!(tx_id(&tx), hash_tx(b"payload"));
    }

    #[test]
    fn combine_is_hash_of_concatenation() {
        let a = Hash256([1u8; 32]);
        let b = Hash256([2u8; 32]);
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&a.0);
        buf[32..].copy_from_slice(&b.0);
        assert_eq!(combine(&a, &b), keccak256(&buf));
    }

    #[test]
    fn combine_is_not_commutative() {
        let a = hash_tx(b"a");
        let b = hash_tx(b"b");
        assert_ne!(combine(&a, &b), combine(&b, &a));
    }
}
