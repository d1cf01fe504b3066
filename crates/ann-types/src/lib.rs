#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod envelope;

pub use envelope::{unwrap_tx, wrap_tx, TX_ENVELOPE_PREFIX_LEN};

pub const HASH256_LEN: usize = 32;

/// Root of an empty transaction list. Signals "no transactions", which is
/// not the same thing as the hash of zero bytes.
pub const EMPTY_DIGEST: Hash256 = Hash256([0u8; HASH256_LEN]);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash256(pub [u8; HASH256_LEN]);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HexError {
    #[error("expected {expected} hex chars, got {got}")]
    BadLength { expected: usize, got: usize },

    #[error("invalid hex: {0}")]
    Invalid(#[from] hex::FromHexError),
}

impl Hash256 {
    pub const fn zero() -> Self {
        Self([0u8; HASH256_LEN])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH256_LEN]
    }

    pub fn as_bytes(&self) -> &[u8; HASH256_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse 64 hex chars, with or without a leading `0x`.
    pub fn from_hex(s: &str) -> Result<Self, HexError> {
        let s = s.trim();
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if s.len() != HASH256_LEN * 2 {
            return Err(HexError::BadLength {
                expected: HASH256_LEN * 2,
                got: s.len(),
            });
        }
        let mut out = [0u8; HASH256_LEN];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

impl core::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// One transaction: an opaque blob, never interpreted at this layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tx(pub Vec<u8>);

impl Tx {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Tx {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Tx {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for Tx {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

/// Ordered transaction list. Order is part of the commitment; duplicates are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Txs(pub Vec<Tx>);

impl Txs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tx: Tx) {
        self.0.push(tx);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Tx> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Tx] {
        &self.0
    }
}

impl From<Vec<Tx>> for Txs {
    fn from(value: Vec<Tx>) -> Self {
        Self(value)
    }
}

impl FromIterator<Tx> for Txs {
    fn from_iter<I: IntoIterator<Item = Tx>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Txs {
    type Item = &'a Tx;
    type IntoIter = core::slice::Iter<'a, Tx>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Height(pub u64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: Height,
    /// Merkle root over `Block::txs`, in block order.
    pub txs_root: Hash256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Txs,
}

pub mod canonical {
    use super::{BlockHeader, Hash256, Height, Tx, Txs, HASH256_LEN};
    use thiserror::Error;

    const MAGIC_HDR: [u8; 8] = *b"ANN_HDR0";
    const MAGIC_TXS: [u8; 8] = *b"ANN_TXS0";

    pub const BLOCK_HEADER_LEN: usize = 8 + 8 + HASH256_LEN;

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum CanonicalError {
        #[error("unexpected eof at {at} (needed {needed}, remaining {remaining})")]
        UnexpectedEof {
            at: usize,
            needed: usize,
            remaining: usize,
        },

        #[error("invalid magic at {at}")]
        InvalidMagic { at: usize },

        #[error("length overflow at {at}")]
        LengthOverflow { at: usize },

        #[error("trailing bytes at {at}")]
        TrailingBytes { at: usize },
    }

    pub type Result<T> = core::result::Result<T, CanonicalError>;

    struct Cursor<'a> {
        buf: &'a [u8],
        pos: usize,
    }

    impl<'a> Cursor<'a> {
        fn new(buf: &'a [u8]) -> Self {
            Self { buf, pos: 0 }
        }

        fn remaining(&self) -> usize {
            self.buf.len() - self.pos
        }

        fn eof(&self, needed: usize) -> CanonicalError {
            CanonicalError::UnexpectedEof {
                at: self.pos,
                needed,
                remaining: self.remaining(),
            }
        }

        fn take(&mut self, n: usize) -> Result<&'a [u8]> {
            let end = self.pos.checked_add(n).ok_or_else(|| self.eof(n))?;
            let head = self.buf.get(self.pos..end).ok_or_else(|| self.eof(n))?;
            self.pos = end;
            Ok(head)
        }

        fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
            let mut out = [0u8; N];
            out.copy_from_slice(self.take(N)?);
            Ok(out)
        }

        fn expect_magic(&mut self, m: &[u8; 8]) -> Result<()> {
            let at = self.pos;
            if self.take_array::<8>()? != *m {
                return Err(CanonicalError::InvalidMagic { at });
            }
            Ok(())
        }

        /// u32 length prefix followed by that many bytes, borrowed from the input.
        fn take_prefixed(&mut self) -> Result<&'a [u8]> {
            let len = u32::from_be_bytes(self.take_array()?) as usize;
            self.take(len)
        }

        fn expect_end(&self) -> Result<()> {
            match self.remaining() {
                0 => Ok(()),
                _ => Err(CanonicalError::TrailingBytes { at: self.pos }),
            }
        }
    }

    fn push_u32_be(out: &mut Vec<u8>, v: u32) {
        out.extend_from_slice(&v.to_be_bytes());
    }
    fn push_u64_be(out: &mut Vec<u8>, v: u64) {
        out.extend_from_slice(&v.to_be_bytes());
    }

    fn len_u32(len: usize, at: usize) -> Result<u32> {
        len.try_into()
            .map_err(|_| CanonicalError::LengthOverflow { at })
    }

    fn push_bytes_len_u32(out: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
        let len = len_u32(bytes.len(), out.len())?;
        push_u32_be(out, len);
        out.extend_from_slice(bytes);
        Ok(())
    }

    // ---------------- BlockHeader ----------------

    pub fn encode_block_header(h: &BlockHeader) -> Vec<u8> {
        let mut out = Vec::with_capacity(BLOCK_HEADER_LEN);
        out.extend_from_slice(&MAGIC_HDR);
        push_u64_be(&mut out, h.height.0);
        out.extend_from_slice(&h.txs_root.0);
        out
    }

    pub fn decode_block_header(bytes: &[u8]) -> Result<BlockHeader> {
        let mut c = Cursor::new(bytes);
        c.expect_magic(&MAGIC_HDR)?;
        let height = Height(u64::from_be_bytes(c.take_array()?));
        let txs_root = Hash256(c.take_array()?);
        c.expect_end()?;
        Ok(BlockHeader { height, txs_root })
    }

    // ---------------- Transaction list ----------------
    // MAGIC || u32 count || (u32 len || bytes)*

    pub fn encode_txs(txs: &Txs) -> Result<Vec<u8>> {
        let payload: usize = txs.iter().map(|t| 4 + t.len()).sum();
        let mut out = Vec::with_capacity(8 + 4 + payload);
        out.extend_from_slice(&MAGIC_TXS);
        let count = len_u32(txs.len(), out.len())?;
        push_u32_be(&mut out, count);
        for tx in txs {
            push_bytes_len_u32(&mut out, tx.as_bytes())?;
        }
        Ok(out)
    }

    pub fn decode_txs(bytes: &[u8]) -> Result<Txs> {
        let mut c = Cursor::new(bytes);
        c.expect_magic(&MAGIC_TXS)?;
        let count = u32::from_be_bytes(c.take_array()?) as usize;

        // each entry carries at least its 4-byte length
        let mut txs = Vec::with_capacity(count.min(c.remaining() / 4));
        for _ in 0..count {
            let b = c.take_prefixed()?;
            txs.push(Tx(b.to_vec()));
        }
        c.expect_end()?;
        Ok(Txs(txs))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn sample_txs() -> Txs {
            vec![
                Tx(vec![1, 2, 3]),
                Tx(vec![]),
                Tx(b"transfer".to_vec()),
            ]
            .into()
        }

        #[test]
        fn block_header_encoding_is_fixed_size() {
            let h = BlockHeader {
                height: Height(1),
                txs_root: Hash256::zero(),
            };
            assert_eq!(encode_block_header(&h).len(), BLOCK_HEADER_LEN);
        }

        #[test]
        fn block_header_roundtrip() {
            let h = BlockHeader {
                height: Height(77),
                txs_root: Hash256([5u8; 32]),
            };
            let dec = decode_block_header(&encode_block_header(&h)).unwrap();
            assert_eq!(h, dec);
        }

        #[test]
        fn txs_roundtrip_keeps_order_and_empty_entries() {
            let txs = sample_txs();
            let enc = encode_txs(&txs).unwrap();
            let dec = decode_txs(&enc).unwrap();
            assert_eq!(txs, dec);
            assert!(dec.as_slice()[1].is_empty());
        }

        #[test]
        fn txs_layout_is_big_endian_length_prefixed() {
            let txs: Txs = vec![Tx(vec![0xaa, 0xbb])].into();
            let enc = encode_txs(&txs).unwrap();
            assert_eq!(&enc[..8], b"ANN_TXS0");
            assert_eq!(&enc[8..12], &[0, 0, 0, 1]);
            assert_eq!(&enc[12..16], &[0, 0, 0, 2]);
            assert_eq!(&enc[16..], &[0xaa, 0xbb]);
        }

        #[test]
        fn empty_list_encodes_zero_count() {
            let enc = encode_txs(&Txs::new()).unwrap();
            assert_eq!(enc.len(), 12);
            assert!(decode_txs(&enc).unwrap().is_empty());
        }

        #[test]
        fn truncated_txs_rejected() {
            let enc = encode_txs(&sample_txs()).unwrap();
            let err = decode_txs(&enc[..enc.len() - 1]).unwrap_err();
            assert!(matches!(err, CanonicalError::UnexpectedEof { .. }));
        }

        #[test]
        fn oversized_count_does_not_preallocate() {
            let mut enc = b"ANN_TXS0".to_vec();
            enc.extend_from_slice(&u32::MAX.to_be_bytes());
            let err = decode_txs(&enc).unwrap_err();
            assert!(matches!(err, CanonicalError::UnexpectedEof { at: 12, .. }));
        }

        #[test]
        fn short_tx_body_reports_offset() {
            let mut enc = b"ANN_TXS0".to_vec();
            enc.extend_from_slice(&1u32.to_be_bytes());
            enc.extend_from_slice(&10u32.to_be_bytes());
            enc.extend_from_slice(&[0xaa, 0xbb]);
            assert_eq!(
                decode_txs(&enc).unwrap_err(),
                CanonicalError::UnexpectedEof { at: 16, needed: 10, remaining: 2 }
            );
        }

        #[test]
        fn truncated_header_rejected() {
            let h = BlockHeader {
                height: Height(9),
                txs_root: Hash256([1u8; 32]),
            };
            let enc = encode_block_header(&h);
            assert_eq!(
                decode_block_header(&enc[..BLOCK_HEADER_LEN - 1]).unwrap_err(),
                CanonicalError::UnexpectedEof { at: 16, needed: 32, remaining: 31 }
            );
        }

        #[test]
        fn trailing_bytes_rejected() {
            let mut enc = encode_txs(&sample_txs()).unwrap();
            enc.push(0);
            let err = decode_txs(&enc).unwrap_err();
            assert!(matches!(err, CanonicalError::TrailingBytes { .. }));
        }

        #[test]
        fn invalid_magic_rejected() {
            let bytes = vec![0u8; BLOCK_HEADER_LEN];
            let err = decode_block_header(&bytes).unwrap_err();
            assert!(matches!(err, CanonicalError::InvalidMagic { at: 0 }));

            let err = decode_txs(&bytes).unwrap_err();
            assert!(matches!(err, CanonicalError::InvalidMagic { at: 0 }));
        }
    }
}
