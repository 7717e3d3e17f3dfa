//! Four-element digests
//!
//! Note commitments, nullifiers, owner addresses and every tree root in the
//! rollup are `[Felt; 4]` values produced by Rescue-Prime.

use crate::field::{felt_to_u64, try_felt_from_u64, Felt, FELT_ZERO};

/// Number of field elements in a digest
pub const DIGEST_SIZE: usize = 4;

/// A Rescue-Prime digest
pub type Digest = [Felt; DIGEST_SIZE];

/// The all-zero digest (empty leaf, absent note or nullifier)
pub const DIGEST_ZERO: Digest = [FELT_ZERO; DIGEST_SIZE];

/// Whether every element of the digest is zero
pub fn digest_is_zero(digest: &Digest) -> bool {
    digest.iter().all(|e| *e == FELT_ZERO)
}

/// Canonical u64 limbs of a digest
pub fn digest_to_u64s(digest: &Digest) -> [u64; DIGEST_SIZE] {
    [
        felt_to_u64(digest[0]),
        felt_to_u64(digest[1]),
        felt_to_u64(digest[2]),
        felt_to_u64(digest[3]),
    ]
}

/// Build a digest from u64 limbs, rejecting non-canonical limbs
pub fn try_digest_from_u64s(limbs: &[u64; DIGEST_SIZE]) -> Option<Digest> {
    Some([
        try_felt_from_u64(limbs[0])?,
        try_felt_from_u64(limbs[1])?,
        try_felt_from_u64(limbs[2])?,
        try_felt_from_u64(limbs[3])?,
    ])
}

/// Hex encoding of a digest: 32 bytes, limbs little-endian
pub fn digest_to_hex(digest: &Digest) -> String {
    let mut bytes = [0u8; 32];
    for (chunk, limb) in bytes.chunks_mut(8).zip(digest_to_u64s(digest)) {
        chunk.copy_from_slice(&limb.to_le_bytes());
    }
    hex::encode(bytes)
}

/// Parse a digest from its hex encoding
pub fn digest_from_hex(s: &str) -> Result<Digest, hex::FromHexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s)?;
    if bytes.len() != 32 {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    let mut limbs = [0u64; DIGEST_SIZE];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks(8)) {
        let mut le = [0u8; 8];
        le.copy_from_slice(chunk);
        *limb = u64::from_le_bytes(le);
    }
    try_digest_from_u64s(&limbs).ok_or(hex::FromHexError::InvalidStringLength)
}

/// Serde adapter serializing a digest as its hex string
///
/// Use with `#[serde(with = "rollup_stark_primitives::digest::hex_digest")]`.
pub mod hex_digest {
    use super::{digest_from_hex, digest_to_hex, Digest};

    pub fn serialize<S: serde::Serializer>(digest: &Digest, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&digest_to_hex(digest))
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Digest, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        digest_from_hex(&s).map_err(serde::de::Error::custom)
    }
}
