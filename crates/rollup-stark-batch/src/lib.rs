//! Rollup STARK batch engine
//!
//! Composes already-proven inner transactions into one STARK proof of a
//! rollup state transition.
//!
//! # Architecture
//!
//! - **State**: data tree, nullifier set and historical-roots tree over Rescue
//!   sparse Merkle trees, with versioned propose/commit semantics
//! - **Assembler**: width resolution, aligned insertion, padding and per-slot
//!   Merkle witnesses computed against a fork of the state
//! - **AIR**: dual-chain Merkle updates for every leaf write, running roots
//!   and per-asset fee accumulators, bound to a schedule derived from the
//!   public inputs
//! - **Prover / Verifier**: inner proof checks and winterfell proving, and
//!   the matching verification of proof bytes, inner proofs included
//! - **Codec**: the flat public-input vector and the proof byte format
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use rollup_stark_batch::{build_batch, verify_rollup_proof, RollupCircuitData, RollupConfig, RollupProver, WorldState};
//!
//! let (circuit, system) = RollupCircuitData::with_mock_system(RollupConfig::testing())?;
//! let circuit = Arc::new(circuit);
//! let mut state = WorldState::new(&circuit.config.depths)?;
//!
//! let batch = build_batch(&state, &circuit, 4, &proofs)?;
//! let proof = RollupProver::new(circuit.clone()).prove(&batch)?;
//!
//! let result = verify_rollup_proof(&proof.proof_bytes, &circuit)?;
//! if result.is_valid_transition_from(&state.roots()) {
//!     batch.commit_to(&mut state)?;
//! }
//! ```

pub mod air;
pub mod assembler;
pub mod codec;
pub mod config;
pub mod error;
pub mod prover;
pub mod public_inputs;
pub mod serialization;
pub mod state;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for convenience
pub use error::{
    BatchError, BatchResult, CodecError, ProofError, ProofResult, SerializationError, StateError,
    TreeError, VerifyError,
};
pub use public_inputs::RollupPublicInputs;

// Configuration
pub use config::{RollupCircuitData, RollupConfig, TreeDepths, MAX_TREE_DEPTH};

// State types
pub use state::{
    HashPath, LeafUpdate, NullifierSet, SparseMerkleTree, StateRoots, StateTransition, TreeId,
    WorldState, WorldStateSnapshot,
};

// Assembly
pub use assembler::{build_batch, BatchAssembler, RollupBatch, SlotWitness};

// Codec
pub use codec::{
    decode_proof_bytes, encode_proof_bytes, public_input_len, split_proof_bytes, ProofParts,
    RollupResult,
};

// Prover and verifier types
pub use prover::{prove, RollupProof, RollupProofMetadata, RollupProver, RollupTraceBuilder};
pub use verifier::{verify_rollup_proof, RollupVerifier, VerificationResult};

// Serialization
pub use serialization::SerializableRollupProof;
