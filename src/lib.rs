//! Rollup STARK - batch proofs for a private-transaction rollup
//!
//! A sequencer collects already-proven inner transactions (join-splits,
//! account registrations, bridge claims), pads them to a supported width,
//! applies their notes and nullifiers to a versioned Merkle world state and
//! proves the resulting root transition with a single STARK. The proof bytes
//! carry the batch's public inputs so that a verifier needs nothing else.
//!
//! # Crates
//!
//! - `rollup-stark-primitives`: Goldilocks field, Rescue-Prime and SHA-256 hashing, digests
//! - `rollup-stark-air`: Rescue round constraints and proof options
//! - `rollup-stark-inner`: inner proof contract, decoder and a mock proof system
//! - `rollup-stark-batch`: world state, batch assembly, rollup AIR, prover, verifier and codec
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rollup_stark::batch::{build_batch, RollupCircuitData, RollupConfig, RollupProver, WorldState};
//!
//! let (circuit, _system) = RollupCircuitData::with_mock_system(RollupConfig::testing()).unwrap();
//! let circuit = Arc::new(circuit);
//! let mut state = WorldState::new(&circuit.config.depths).unwrap();
//! # let proofs = vec![circuit.padding_proof.clone()];
//! let batch = build_batch(&state, &circuit, 4, &proofs).unwrap();
//! let proof = RollupProver::new(circuit.clone()).prove(&batch).unwrap();
//! batch.commit_to(&mut state).unwrap();
//! ```

// Re-export sub-crates
pub use rollup_stark_air as air;
pub use rollup_stark_batch as batch;
pub use rollup_stark_inner as inner;
pub use rollup_stark_primitives as primitives;
