//! Fuzz target for rollup proof deserialization
//!
//! This target ensures:
//! 1. The binary proof envelope never panics on arbitrary input
//! 2. Verification of arbitrary proof bytes never panics
//! 3. Garbage is rejected gracefully, as an error or `verified: false`

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

use rollup_stark_batch::{RollupCircuitData, RollupConfig, RollupVerifier, SerializableRollupProof};

#[derive(Debug, Arbitrary)]
enum FuzzInput {
    Envelope(Vec<u8>),
    ProofBytes(Vec<u8>),
}

fuzz_target!(|input: FuzzInput| {
    match input {
        FuzzInput::Envelope(bytes) => {
            if let Ok(envelope) = SerializableRollupProof::from_bytes(&bytes) {
                let again = envelope.to_bytes().expect("decoded envelope re-encodes");
                let reparsed = SerializableRollupProof::from_bytes(&again)
                    .expect("re-encoded envelope parses");
                assert_eq!(reparsed, envelope);
            }
        }
        FuzzInput::ProofBytes(bytes) => {
            let (circuit, _) = RollupCircuitData::with_mock_system(RollupConfig::testing())
                .expect("testing circuit is valid");
            let verifier = RollupVerifier::new(Arc::new(circuit)).expect("testing options are valid");
            if let Ok(result) = verifier.verify(&bytes) {
                assert!(!result.verified, "random bytes must never verify");
            }
        }
    }
});
