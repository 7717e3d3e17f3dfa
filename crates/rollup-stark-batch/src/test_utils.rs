//! Fixtures shared by unit tests

use std::sync::Once;

use rollup_stark_inner::{derive_key, HashProofSystem, JoinSplitTx, RawInnerProof, ValueNote};
use rollup_stark_primitives::DIGEST_ZERO;

static INIT: Once = Once::new();

/// Route `tracing` output through the test harness; `RUST_LOG` selects levels
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A join-split spending 150 into 143 on asset 1, leaving a fee of 7
pub fn transfer(system: &HashProofSystem, seed: u64) -> RawInnerProof {
    let owner = derive_key("owner", seed);
    let input = ValueNote {
        owner,
        value: 150,
        asset_id: 1,
        secret: derive_key("secret-in", seed),
        nonce: seed,
    };
    let output = ValueNote {
        owner: derive_key("recipient", seed),
        value: 143,
        asset_id: 1,
        secret: derive_key("secret-out", seed),
        nonce: seed,
    };
    let tx = JoinSplitTx {
        asset_id: 1,
        public_input: 0,
        public_output: 0,
        input_notes: vec![input],
        output_notes: vec![output],
        spending_key: derive_key("spending", seed),
        input_owner: owner,
        output_owner: DIGEST_ZERO,
    };
    system.prove(&tx.record().unwrap())
}
