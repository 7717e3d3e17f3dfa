//! Fuzz target for the rollup public-input codec
//!
//! This target ensures:
//! 1. Decoding never panics on any element vector
//! 2. Whatever decodes re-encodes to the same elements

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rollup_stark_batch::{public_input_len, RollupResult};
use rollup_stark_primitives::{felt_from_u64, Felt};

#[derive(Debug, Arbitrary)]
struct CodecInput {
    /// Claimed width, written at its fixed position
    width: u8,
    values: Vec<u64>,
}

fuzz_target!(|input: CodecInput| {
    // Limit input size to avoid OOM
    let mut elements: Vec<Felt> = input
        .values
        .iter()
        .take(2_000)
        .map(|&v| felt_from_u64(v))
        .collect();
    if elements.len() > 1 {
        elements[1] = felt_from_u64(input.width as u64);
    }

    if let Ok(result) = RollupResult::decode(&elements) {
        assert_eq!(elements.len(), public_input_len(result.width));
        assert_eq!(result.encode(), elements, "codec should round-trip");
    }
});
