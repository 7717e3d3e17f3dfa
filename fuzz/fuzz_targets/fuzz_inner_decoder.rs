//! Fuzz target for the inner proof decoder
//!
//! This target ensures:
//! 1. Decoding raw inner proof bytes never panics
//! 2. Decoded records re-encode to the same public inputs
//! 3. Mock verification never panics and never accepts a tampered tag

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rollup_stark_inner::{
    decode_inner_proof, HashProofSystem, InnerProofSystem, ProofKind,
};

#[derive(Debug, Arbitrary)]
struct DecoderInput {
    kind: u8,
    bytes: Vec<u8>,
}

fuzz_target!(|input: DecoderInput| {
    let kind = ProofKind::ALL[input.kind as usize % ProofKind::ALL.len()];
    let system = HashProofSystem::new();
    let vk = system.verification_keys().for_kind(kind);

    // Never panics, whatever the bytes
    let _ = system.verify(&input.bytes, vk);

    if let Ok(proof) = decode_inner_proof(&input.bytes, kind) {
        assert_eq!(proof.kind(), kind);

        let reproved = system.prove(&proof.record);
        assert!(system.verify(&reproved.data, vk), "honest proof should verify");
        assert_eq!(
            decode_inner_proof(&reproved.data, kind).map(|p| p.record),
            Ok(proof.record),
            "record should survive re-encoding"
        );

        let mut tampered = reproved.data;
        if let Some(last) = tampered.last_mut() {
            *last ^= 1;
        }
        assert!(!system.verify(&tampered, vk), "tampered tag must not verify");
    }
});
