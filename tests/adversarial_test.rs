//! Adversarial tests for rollup proofs
//!
//! These tests check that the engine rejects:
//! - Public inputs edited after proving
//! - Forged or mis-declared inner proofs
//! - Double spends, within a batch and against the state
//! - Stale or replayed state transitions
//! - Malformed proof bytes
//!
//! A passing suite doesn't prove soundness, but a failure here points at a
//! hole that must be investigated.

mod common;

use common::{join_split, setup};
use rollup_stark_batch::codec::split_proof_bytes;
use rollup_stark_batch::{
    build_batch, encode_proof_bytes, BatchError, ProofError, RollupProver, RollupResult,
    RollupVerifier, StateError, VerifyError,
};
use rollup_stark_inner::{decode_raw, InnerProofError, ProofKind, RawInnerProof};
use rollup_stark_primitives::felt_from_u64;

// =============================================================================
// Test Helpers
// =============================================================================

/// Re-encode a proof's public inputs after `edit`, keeping the other sections
fn tamper(proof_bytes: &[u8], edit: impl FnOnce(&mut RollupResult)) -> Vec<u8> {
    let parts = split_proof_bytes(proof_bytes).unwrap();
    let mut result = RollupResult::decode(&parts.public_inputs).unwrap();
    edit(&mut result);
    encode_proof_bytes(&result, &parts.inner_proofs, parts.stark_proof)
}

/// Swap the inner proof carried for `slot`, keeping the other sections
fn replace_inner_proof(proof_bytes: &[u8], slot: usize, inner: &[u8]) -> Vec<u8> {
    let parts = split_proof_bytes(proof_bytes).unwrap();
    let result = RollupResult::decode(&parts.public_inputs).unwrap();
    let mut inner_proofs = parts.inner_proofs.clone();
    inner_proofs[slot] = inner;
    encode_proof_bytes(&result, &inner_proofs, parts.stark_proof)
}

// =============================================================================
// Tampered Public Inputs
// =============================================================================

#[test]
fn test_tampered_public_inputs_rejected() {
    let (circuit, system, state) = setup();
    let batch = build_batch(&state, &circuit, 2, &[join_split(&system, 1, 1, 7)]).unwrap();
    let proof = RollupProver::new(circuit.clone()).prove(&batch).unwrap();
    let verifier = RollupVerifier::new(circuit.clone()).unwrap();
    assert!(verifier.verify(&proof.proof_bytes).unwrap().verified);

    let edits: [(&str, fn(&mut RollupResult)); 10] = [
        ("fee total", |r| r.total_fees[1] = 70),
        ("fee asset", |r| r.total_fees = [7, 0, 0, 0]),
        ("new data root", |r| r.new_data_root[0] = felt_from_u64(1)),
        ("old nullifier root", |r| r.old_nullifier_root[3] = felt_from_u64(5)),
        ("new roots root", |r| r.new_roots_root[2] = felt_from_u64(9)),
        ("batch id", |r| r.batch_id = 1),
        ("start index", |r| r.data_start_index = 4),
        ("slot note", |r| r.inner_proofs[0].new_note2[1] = felt_from_u64(3)),
        ("slot nullifier", |r| r.inner_proofs[0].nullifier1[0] = felt_from_u64(11)),
        ("slot fee", |r| r.inner_proofs[0].tx_fee = 8),
    ];

    for (name, edit) in edits {
        let forged = tamper(&proof.proof_bytes, edit);
        let result = verifier.verify(&forged).unwrap();
        assert!(!result.verified, "tampered {name} should not verify");
        assert!(result.error.is_some());
    }
}

#[test]
fn test_proof_hash_mismatch_rejected() {
    let (circuit, system, state) = setup();
    let batch = build_batch(&state, &circuit, 1, &[join_split(&system, 2, 1, 7)]).unwrap();
    let mut proof = RollupProver::new(circuit.clone()).prove(&batch).unwrap();
    proof.proof_hash = "00".repeat(32);

    let result = RollupVerifier::new(circuit.clone())
        .unwrap()
        .verify_proof(&proof)
        .unwrap();
    assert!(!result.verified);
    assert!(result.error.unwrap().contains("hash"));
}

// =============================================================================
// Inner Proofs
// =============================================================================

#[test]
fn test_forged_inner_proof_rejected_by_prover() {
    let (circuit, system, state) = setup();
    let honest = join_split(&system, 3, 1, 7);
    let original = join_split(&system, 13, 1, 7);

    // Claim a larger fee, keeping the original proof body
    let mut record = decode_raw(&original).unwrap().record;
    record.tx_fee += 100;
    let mut forged = system.prove(&record);
    let body_start = forged.data.len() - 32;
    forged.data[body_start..].copy_from_slice(&original.data[original.data.len() - 32..]);

    let batch = build_batch(&state, &circuit, 2, &[honest, forged]).unwrap();
    let err = RollupProver::new(circuit).prove(&batch).unwrap_err();
    assert!(matches!(err, ProofError::InnerProofRejected { slot: 1, kind: ProofKind::JoinSplit }));
}

#[test]
fn test_substituted_inner_proof_rejected_by_verifier() {
    let (circuit, system, state) = setup();
    let batch = build_batch(&state, &circuit, 2, &[join_split(&system, 14, 1, 7)]).unwrap();
    let proof = RollupProver::new(circuit.clone()).prove(&batch).unwrap();
    let verifier = RollupVerifier::new(circuit.clone()).unwrap();

    // a valid proof, but of a different transaction
    let other = join_split(&system, 15, 1, 7);
    let swapped = replace_inner_proof(&proof.proof_bytes, 0, &other.data);
    let result = verifier.verify(&swapped).unwrap();
    assert!(!result.verified);
    assert!(result.error.unwrap().contains("does not match"));

    // the padding slot's proof with a corrupted body
    let mut padding = circuit.padding_proof.data.clone();
    let last = padding.len() - 1;
    padding[last] ^= 0x80;
    let corrupted = replace_inner_proof(&proof.proof_bytes, 1, &padding);
    let result = verifier.verify(&corrupted).unwrap();
    assert!(!result.verified);
    assert!(result.error.unwrap().contains("slot 1 rejected"));

    // the slot's proof left out entirely
    let parts = split_proof_bytes(&proof.proof_bytes).unwrap();
    let dropped = encode_proof_bytes(&proof.result, &parts.inner_proofs[..1], parts.stark_proof);
    assert!(!verifier.verify(&dropped).unwrap().verified);
}

#[test]
fn test_mis_declared_kind_rejected() {
    let (circuit, system, state) = setup();
    let honest = join_split(&system, 4, 1, 7);
    let mislabeled = RawInnerProof::new(ProofKind::Claim, honest.data);

    let err = build_batch(&state, &circuit, 1, &[mislabeled]).unwrap_err();
    assert!(matches!(
        err,
        BatchError::MalformedProof { slot: 0, source: InnerProofError::KindMismatch { .. } }
    ));
}

#[test]
fn test_truncated_inner_proof_rejected() {
    let (circuit, system, state) = setup();
    let mut raw = join_split(&system, 5, 1, 7);
    raw.data.truncate(40);

    let err = build_batch(&state, &circuit, 1, &[raw]).unwrap_err();
    assert!(matches!(err, BatchError::MalformedProof { slot: 0, .. }));
}

// =============================================================================
// Double Spends
// =============================================================================

#[test]
fn test_nullifier_at_reserved_index_rejected_by_verifier() {
    let (circuit, system, state) = setup();
    let batch = build_batch(&state, &circuit, 1, &[join_split(&system, 16, 1, 7)]).unwrap();
    let proof = RollupProver::new(circuit.clone()).prove(&batch).unwrap();

    // first limb zero: index 0 at every nullifier depth
    let forged = tamper(&proof.proof_bytes, |r| {
        r.inner_proofs[0].nullifier2 = [0, 5, 6, 7].map(felt_from_u64);
    });
    let result = RollupVerifier::new(circuit.clone()).unwrap().verify(&forged).unwrap();
    assert!(!result.verified);
    assert!(result.error.unwrap().contains("reserved index 0"));
}

#[test]
fn test_double_spend_within_batch() {
    let (circuit, system, state) = setup();
    let tx = join_split(&system, 6, 1, 7);
    let roots = state.roots();

    let err = build_batch(&state, &circuit, 2, &[tx.clone(), tx]).unwrap_err();
    assert!(matches!(err, BatchError::DoubleSpend { slot: 1, .. }));
    assert_eq!(state.roots(), roots);
}

#[test]
fn test_double_spend_across_batches() {
    let (circuit, system, mut state) = setup();
    let tx = join_split(&system, 7, 1, 7);

    let first = build_batch(&state, &circuit, 1, &[tx.clone()]).unwrap();
    first.commit_to(&mut state).unwrap();

    let roots = state.roots();
    let version = state.version();
    let err = build_batch(&state, &circuit, 1, &[tx]).unwrap_err();
    assert!(matches!(err, BatchError::DoubleSpend { slot: 0, .. }));
    assert_eq!(state.roots(), roots);
    assert_eq!(state.version(), version);
}

// =============================================================================
// State Transitions
// =============================================================================

#[test]
fn test_stale_batch_cannot_commit() {
    let (circuit, system, mut state) = setup();
    let a = build_batch(&state, &circuit, 1, &[join_split(&system, 8, 1, 7)]).unwrap();
    let b = build_batch(&state, &circuit, 1, &[join_split(&system, 9, 1, 7)]).unwrap();

    a.commit_to(&mut state).unwrap();
    let roots = state.roots();

    let err = b.commit_to(&mut state).unwrap_err();
    assert!(matches!(err, StateError::StaleVersion { .. }));
    assert_eq!(state.roots(), roots);

    // replaying the committed batch is stale as well
    assert!(a.commit_to(&mut state).is_err());
}

#[test]
fn test_proof_from_other_state_breaks_chain() {
    let (circuit, system, mut state) = setup();
    let genesis = state.roots();
    let prover = RollupProver::new(circuit.clone());

    let a = build_batch(&state, &circuit, 1, &[join_split(&system, 10, 1, 7)]).unwrap();
    let b = build_batch(&state, &circuit, 1, &[join_split(&system, 11, 1, 7)]).unwrap();
    let proof_a = prover.prove(&a).unwrap();
    let proof_b = prover.prove(&b).unwrap();
    a.commit_to(&mut state).unwrap();

    let verifier = RollupVerifier::new(circuit.clone()).unwrap();
    // b is a valid proof, but of a transition from genesis
    assert!(verifier.verify(&proof_b.proof_bytes).unwrap().verified);

    let chain = verifier
        .verify_chain(&genesis, &[&proof_a.proof_bytes, &proof_b.proof_bytes])
        .unwrap();
    assert_eq!(chain.len(), 2);
    assert!(chain[0].verified);
    assert!(!chain[1].verified);
    assert!(!chain[1].is_valid_transition_from(&state.roots()));
}

// =============================================================================
// Malformed Bytes
// =============================================================================

#[test]
fn test_malformed_proof_bytes() {
    let (circuit, system, state) = setup();
    let batch = build_batch(&state, &circuit, 1, &[join_split(&system, 12, 1, 7)]).unwrap();
    let proof = RollupProver::new(circuit.clone()).prove(&batch).unwrap();
    let verifier = RollupVerifier::new(circuit.clone()).unwrap();

    assert!(matches!(verifier.verify(&[]), Err(VerifyError::Codec(_))));
    assert!(matches!(verifier.verify(&[0xFF; 64]), Err(VerifyError::Codec(_))));

    // public inputs intact, STARK proof cut short
    let truncated = &proof.proof_bytes[..proof.proof_bytes.len() - 100];
    let result = verifier.verify(truncated).unwrap();
    assert!(!result.verified);

    // a single flipped bit in the STARK proof
    let stark = split_proof_bytes(&proof.proof_bytes).unwrap().stark_proof;
    let mut flipped = proof.proof_bytes.clone();
    let middle = flipped.len() - stark.len() / 2;
    flipped[middle] ^= 0x01;
    assert!(!verifier.verify(&flipped).unwrap().verified);
}
