//! Rollup STARK Primitives
//!
//! Cryptographic building blocks shared by the rollup crates:
//! - Field arithmetic using Winterfell's BaseElement (64-bit Goldilocks prime field)
//! - Rescue-Prime hash function, the node hash of every rollup Merkle tree
//! - Four-element digests for commitments, nullifiers and roots
//! - Domain-separated SHA-256

pub mod digest;
pub mod field;
pub mod hash;
pub mod rescue;

pub use digest::{
    digest_from_hex, digest_is_zero, digest_to_hex, digest_to_u64s, try_digest_from_u64s, Digest,
    DIGEST_SIZE, DIGEST_ZERO,
};
pub use field::{
    felt_from_u64, felt_to_u64, try_felt_from_u64, Felt, FELT_ONE, FELT_ZERO, GOLDILOCKS_PRIME,
};
pub use hash::Hash256;
pub use rescue::{rescue_hash, rescue_hash_pair, RescueState};
