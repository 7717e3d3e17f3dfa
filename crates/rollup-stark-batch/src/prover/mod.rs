//! Rollup prover module
//!
//! Inner proof checks, trace construction and STARK proving for assembled batches.

mod rollup_prover;
mod rollup_trace;

pub use rollup_prover::{
    prove, Hasher, RandCoin, RollupProof, RollupProofMetadata, RollupProver, VectorCommit,
};
pub use rollup_trace::RollupTraceBuilder;
