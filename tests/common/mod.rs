//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Once};

use rollup_stark_batch::{RollupCircuitData, RollupConfig, WorldState};
use rollup_stark_inner::{derive_key, HashProofSystem, JoinSplitTx, RawInnerProof, ValueNote};
use rollup_stark_primitives::{felt_from_u64, rescue_hash, Digest, DIGEST_ZERO};

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Testing circuit backed by the mock inner proof system
pub fn setup() -> (Arc<RollupCircuitData>, Arc<HashProofSystem>, WorldState) {
    init_test_logging();
    let (circuit, system) = RollupCircuitData::with_mock_system(RollupConfig::testing())
        .expect("testing circuit should be valid");
    let state = WorldState::new(&circuit.config.depths).expect("testing depths should be valid");
    (Arc::new(circuit), system, state)
}

/// A note commitment unrelated to any transaction
pub fn filler_note(n: u64) -> Digest {
    rescue_hash(&[felt_from_u64(0xF111), felt_from_u64(n)])
}

/// Append `count` unrelated leaves to the data tree
pub fn prefill(state: &mut WorldState, count: u64) {
    for n in 0..count {
        state.insert_note(filler_note(n)).expect("prefill fits the data tree");
    }
}

pub fn value_note(label: &str, seed: u64, value: u64, asset_id: u32) -> ValueNote {
    ValueNote {
        owner: derive_key(&format!("{label}-owner"), seed),
        value,
        asset_id,
        secret: derive_key(&format!("{label}-secret"), seed),
        nonce: seed,
    }
}

/// A join-split spending two notes into two notes on `asset_id`, leaving `fee`
pub fn join_split(system: &HashProofSystem, seed: u64, asset_id: u32, fee: u64) -> RawInnerProof {
    let inputs = vec![
        value_note("in-a", seed, 100 + fee, asset_id),
        value_note("in-b", seed, 50, asset_id),
    ];
    let outputs = vec![
        value_note("out-a", seed, 60, asset_id),
        value_note("out-b", seed, 90, asset_id),
    ];
    let tx = JoinSplitTx {
        asset_id,
        public_input: 0,
        public_output: 0,
        input_owner: inputs[0].owner,
        output_owner: outputs[0].owner,
        spending_key: derive_key("spending", seed),
        input_notes: inputs,
        output_notes: outputs,
    };
    system.prove(&tx.record().expect("join-split should balance"))
}

/// A deposit minting one note, with no nullifiers
pub fn deposit(system: &HashProofSystem, seed: u64, asset_id: u32, amount: u64, fee: u64) -> RawInnerProof {
    let output = value_note("deposit", seed, amount - fee, asset_id);
    let tx = JoinSplitTx {
        asset_id,
        public_input: amount,
        public_output: 0,
        input_notes: Vec::new(),
        spending_key: DIGEST_ZERO,
        input_owner: DIGEST_ZERO,
        output_owner: output.owner,
        output_notes: vec![output],
    };
    system.prove(&tx.record().expect("deposit should balance"))
}
