//! Field arithmetic using Winterfell's BaseElement (Goldilocks 64-bit prime field)
//!
//! The Goldilocks field is defined by the prime p = 2^64 - 2^32 + 1. Amounts,
//! indices and tags in the rollup are canonical `u64` values below p.

use winter_math::fields::f64::BaseElement;
use winter_math::FieldElement;

/// The field element type used throughout the rollup engine
pub type Felt = BaseElement;

/// Zero in the field
pub const FELT_ZERO: Felt = BaseElement::ZERO;

/// One in the field
pub const FELT_ONE: Felt = BaseElement::ONE;

/// The Goldilocks prime: p = 2^64 - 2^32 + 1
pub const GOLDILOCKS_PRIME: u64 = 0xFFFFFFFF00000001;

/// Convert a u64 to a field element (reduces mod p)
#[inline]
pub fn felt_from_u64(value: u64) -> Felt {
    BaseElement::new(value)
}

/// Convert a u64 to a field element, rejecting non-canonical values
#[inline]
pub fn try_felt_from_u64(value: u64) -> Option<Felt> {
    if value < GOLDILOCKS_PRIME {
        Some(BaseElement::new(value))
    } else {
        None
    }
}

/// Convert a field element to u64 (canonical representative)
#[inline]
pub fn felt_to_u64(felt: Felt) -> u64 {
    felt.as_int()
}

/// Read 8 little-endian bytes as a field element (mod p)
pub fn felt_from_bytes_le(bytes: &[u8]) -> Felt {
    let mut value = 0u64;
    for (i, &b) in bytes.iter().take(8).enumerate() {
        value |= (b as u64) << (i * 8);
    }
    felt_from_u64(value % GOLDILOCKS_PRIME)
}
