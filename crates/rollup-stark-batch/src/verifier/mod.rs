//! Rollup verifier module

mod rollup_verifier;

pub use rollup_verifier::{verify_rollup_proof, RollupVerifier, VerificationResult};
