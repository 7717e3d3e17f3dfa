//! End-to-end tests for rollup batches
//!
//! These tests exercise assembly, proving, verification and commit against a
//! live world state.

mod common;

use common::{deposit, join_split, prefill, setup, value_note};
use rollup_stark_batch::{
    build_batch, decode_proof_bytes, RollupProver, RollupVerifier, SerializableRollupProof,
};
use rollup_stark_inner::{decode_raw, derive_key, AccountTx, ClaimTx, InnerProofRecord, NUM_ASSETS};

#[test]
fn test_width_one_batch_after_four_leaves() {
    let (circuit, system, mut state) = setup();
    prefill(&mut state, 4);

    let raw = join_split(&system, 1, 1, 7);
    let expected = decode_raw(&raw).unwrap().record;
    let batch = build_batch(&state, &circuit, 1, &[raw]).unwrap();

    assert_eq!(batch.width, 1);
    assert_eq!(batch.data_start_index, 4);
    assert_eq!(batch.total_fees, [0, 7, 0, 0]);

    let proof = RollupProver::new(circuit.clone()).prove(&batch).unwrap();
    let verifier = RollupVerifier::new(circuit.clone()).unwrap();
    let result = verifier.verify(&proof.proof_bytes).unwrap();

    assert!(result.verified, "proof should verify: {:?}", result.error);
    assert_eq!(result.decoded.width, 1);
    assert_eq!(result.decoded.data_start_index, 4);
    assert_eq!(result.decoded.total_fees, [0, 7, 0, 0]);
    assert_eq!(result.decoded.inner_proofs, vec![expected]);
    assert!(result.is_valid_transition_from(&state.roots()));
}

#[test]
fn test_requested_width_three_pads_to_four() {
    let (circuit, system, mut state) = setup();
    prefill(&mut state, 4);

    let raw = join_split(&system, 2, 1, 7);
    let expected = decode_raw(&raw).unwrap().record;
    let batch = build_batch(&state, &circuit, 3, &[raw]).unwrap();

    assert_eq!(batch.requested_width, 3);
    assert_eq!(batch.width, 4);
    assert_eq!(batch.data_start_index, 8);
    assert_eq!(batch.num_real(), 1);

    let proof = RollupProver::new(circuit.clone()).prove(&batch).unwrap();
    let result = RollupVerifier::new(circuit.clone())
        .unwrap()
        .verify(&proof.proof_bytes)
        .unwrap();

    assert!(result.verified, "proof should verify: {:?}", result.error);
    let records = &result.decoded.inner_proofs;
    assert_eq!(records.len(), 4);
    assert_eq!(records[0], expected);
    for record in &records[1..] {
        assert_eq!(*record, InnerProofRecord::padding());
        assert!(record.is_zero_effect());
    }
}

#[test]
fn test_sequencer_chain_of_batches() {
    let (circuit, system, mut state) = setup();
    let prover = RollupProver::new(circuit.clone());
    let verifier = RollupVerifier::new(circuit.clone()).unwrap();
    let genesis = state.roots();

    let account = AccountTx {
        alias_id: 42,
        owner_key: derive_key("account", 42),
        signing_keys: [derive_key("signing", 0), derive_key("signing", 1)],
        migrate: true,
    };
    let claim = ClaimTx {
        interaction_nonce: 9,
        output_note: value_note("claim", 9, 500, 2),
        fee: 3,
    };

    let batches = vec![
        vec![deposit(&system, 1, 1, 1_000, 10), join_split(&system, 2, 1, 5)],
        vec![
            system.prove(&account.record()),
            system.prove(&claim.record().unwrap()),
            deposit(&system, 3, 0, 200, 1),
        ],
    ];

    let mut proofs = Vec::new();
    for txs in &batches {
        let batch = build_batch(&state, &circuit, txs.len(), txs).unwrap();
        let proof = prover.prove(&batch).unwrap();
        assert!(verifier.verify_proof(&proof).unwrap().verified);
        batch.commit_to(&mut state).unwrap();
        proofs.push(proof);
    }

    assert_eq!(proofs[0].result.total_fees, [0, 15, 0, 0]);
    assert_eq!(proofs[1].result.total_fees, [1, 0, 3, 0]);
    assert_eq!(proofs[1].result.batch_id, 1);
    // width 2 then width 4: 4 leaves, then aligned to 8
    assert_eq!(proofs[1].result.data_start_index, 8);
    assert_eq!(state.data_size(), 16);
    assert_eq!(state.next_batch_id(), 2);

    let bytes: Vec<&[u8]> = proofs.iter().map(|p| p.proof_bytes.as_slice()).collect();
    let chain = verifier.verify_chain(&genesis, &bytes).unwrap();
    assert_eq!(chain.len(), 2);
    assert!(chain.iter().all(|r| r.verified));
    assert_eq!(chain[1].decoded.new_roots(), state.roots());

    // the historical roots tree records each batch's data root
    for proof in &proofs {
        let index = proof.result.roots_index();
        assert_eq!(state.roots_leaf(index).unwrap(), proof.result.new_data_root);
    }
}

#[test]
fn test_committed_state_matches_hash_paths() {
    let (circuit, system, mut state) = setup();
    let raw = join_split(&system, 5, 3, 2);
    let record = decode_raw(&raw).unwrap().record;

    let batch = build_batch(&state, &circuit, 2, &[raw]).unwrap();
    batch.commit_to(&mut state).unwrap();

    for (offset, note) in record.notes().iter().enumerate() {
        let index = batch.data_start_index + offset as u64;
        assert_eq!(state.data_leaf(index).unwrap(), *note);
        let path = state.data_hash_path(index).unwrap();
        assert!(path.verify(&state.data_root(), note));
    }
    for nullifier in record.nullifiers() {
        assert!(state.contains_nullifier(&nullifier));
        let index = state.nullifiers().index_of(&nullifier);
        let path = state.nullifier_hash_path(index).unwrap();
        assert!(path.verify(&state.nullifier_root(), &nullifier));
    }
    assert_eq!(batch.total_fees.iter().sum::<u64>(), 2);
    assert_eq!(batch.total_fees.len(), NUM_ASSETS);
}

#[test]
fn test_serialized_proof_still_verifies() {
    let (circuit, system, state) = setup();
    let batch = build_batch(&state, &circuit, 1, &[join_split(&system, 6, 1, 7)]).unwrap();
    let proof = RollupProver::new(circuit.clone()).prove(&batch).unwrap();

    let json = SerializableRollupProof::new(proof.clone()).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["proof"]["metadata"]["width"], 1);
    assert_eq!(value["proof"]["result"]["total_fees"][1], 7);
    let from_json = SerializableRollupProof::from_json(&json).unwrap().into_proof();
    let bytes = SerializableRollupProof::new(proof.clone()).to_bytes().unwrap();
    let from_bytes = SerializableRollupProof::from_bytes(&bytes).unwrap().into_proof();

    let verifier = RollupVerifier::new(circuit.clone()).unwrap();
    for restored in [from_json, from_bytes] {
        assert_eq!(restored, proof);
        assert!(verifier.verify_proof(&restored).unwrap().verified);
    }
    assert_eq!(decode_proof_bytes(&proof.proof_bytes).unwrap(), batch.result());
}
