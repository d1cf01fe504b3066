#![forbid(unsafe_code)]

/// Width of the envelope some upstream formats put in front of a raw tx.
pub const TX_ENVELOPE_PREFIX_LEN: usize = 4;

pub fn wrap_tx(prefix: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + payload.len());
    out.extend_from_slice(prefix);
    out.extend_from_slice(payload);
    out
}

/// Strip the envelope prefix. Blobs of `TX_ENVELOPE_PREFIX_LEN` bytes or
/// fewer are returned whole.
pub fn unwrap_tx(bytes: &[u8]) -> &[u8] {
    if bytes.len() > TX_ENVELOPE_PREFIX_LEN {
        &bytes[TX_ENVELOPE_PREFIX_LEN..]
    } else {
        bytes
    }
}
