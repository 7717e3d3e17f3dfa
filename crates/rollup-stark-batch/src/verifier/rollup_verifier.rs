//! Rollup proof verification
//!
//! The verifier decodes the public inputs carried in the proof bytes, checks
//! that they describe a batch this circuit could have produced, re-verifies
//! every slot's inner proof against the key for its kind, and runs the STARK
//! verifier over the recomputed update schedule. Rejection is reported in the
//! result; only undecodable proof bytes are an error.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use winter_verifier::{verify, AcceptableOptions};

use rollup_stark_air::OptionsError;
use rollup_stark_inner::decode_inner_proof;
use rollup_stark_primitives::{digest_is_zero, digest_to_hex};

use crate::air::{RollupAir, UpdateSchedule, TRACE_WIDTH};
use crate::codec::{split_proof_bytes, ProofParts, RollupResult};
use crate::config::{RollupCircuitData, RollupConfig};
use crate::error::VerifyError;
use crate::prover::{Hasher, RandCoin, RollupProof, VectorCommit};
use crate::public_inputs::RollupPublicInputs;
use crate::state::{nullifier_index, StateRoots};

/// Result of rollup proof verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Whether the proof is valid
    pub verified: bool,

    /// Public inputs decoded from the proof bytes
    pub decoded: RollupResult,

    /// Why verification failed
    pub error: Option<String>,

    /// Verification time in milliseconds
    pub verification_time_ms: u64,
}

impl VerificationResult {
    /// Whether the proof verified and starts from `roots`
    pub fn is_valid_transition_from(&self, roots: &StateRoots) -> bool {
        self.verified && self.decoded.old_roots() == *roots
    }
}

/// Verify rollup proof bytes against a circuit
pub fn verify_rollup_proof(
    proof_bytes: &[u8],
    circuit: &RollupCircuitData,
) -> Result<VerificationResult, VerifyError> {
    RollupVerifier::new(Arc::new(circuit.clone()))?.verify(proof_bytes)
}

/// Rollup proof verifier for one circuit
#[derive(Debug, Clone)]
pub struct RollupVerifier {
    circuit: Arc<RollupCircuitData>,
    acceptable_options: Vec<winter_air::ProofOptions>,
}

impl RollupVerifier {
    /// Accept the configured options and the standard presets
    pub fn new(circuit: Arc<RollupCircuitData>) -> Result<Self, OptionsError> {
        let acceptable_options = circuit
            .config
            .acceptable_options()
            .iter()
            .map(|options| options.try_to_winterfell())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            circuit,
            acceptable_options,
        })
    }

    pub fn config(&self) -> &RollupConfig {
        &self.circuit.config
    }

    /// Verify proof bytes
    pub fn verify(&self, proof_bytes: &[u8]) -> Result<VerificationResult, VerifyError> {
        let start = Instant::now();

        let parts = split_proof_bytes(proof_bytes)?;
        let decoded = RollupResult::decode(&parts.public_inputs)?;

        let outcome = self.check(&decoded, &parts);
        let verification_time_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                debug!(batch_id = decoded.batch_id, verification_time_ms, "rollup proof verified");
                Ok(VerificationResult {
                    verified: true,
                    decoded,
                    error: None,
                    verification_time_ms,
                })
            }
            Err(reason) => {
                warn!(batch_id = decoded.batch_id, %reason, "rollup proof rejected");
                Ok(VerificationResult {
                    verified: false,
                    decoded,
                    error: Some(reason),
                    verification_time_ms,
                })
            }
        }
    }

    /// Verify a generated proof, including its recorded hash
    pub fn verify_proof(&self, proof: &RollupProof) -> Result<VerificationResult, VerifyError> {
        let mut result = self.verify(&proof.proof_bytes)?;
        if result.verified && !proof.hash_matches() {
            result.verified = false;
            result.error = Some("proof hash does not match the proof bytes".to_string());
        }
        Ok(result)
    }

    /// Verify a sequence of proofs, each starting where the previous one ended
    ///
    /// Stops at the first proof that fails or breaks the chain; that result is
    /// the last one returned.
    pub fn verify_chain(
        &self,
        genesis: &StateRoots,
        proofs: &[&[u8]],
    ) -> Result<Vec<VerificationResult>, VerifyError> {
        let mut results = Vec::with_capacity(proofs.len());
        let mut roots = *genesis;

        for bytes in proofs {
            let mut result = self.verify(bytes)?;
            if result.verified && result.decoded.old_roots() != roots {
                result.verified = false;
                result.error = Some(format!(
                    "batch {} does not start from the previous batch's roots",
                    result.decoded.batch_id
                ));
            }
            let verified = result.verified;
            roots = result.decoded.new_roots();
            results.push(result);
            if !verified {
                break;
            }
        }

        Ok(results)
    }

    /// Shape checks on the public inputs, the inner proofs, then the STARK check
    fn check(&self, decoded: &RollupResult, parts: &ProofParts<'_>) -> Result<(), String> {
        let depths = &self.config().depths;
        let width = decoded.width;

        if !self.config().supports_width(width) {
            return Err(format!("width {width} is not supported"));
        }

        let block = 2 * width as u64;
        if decoded.data_start_index % block != 0 {
            return Err(format!(
                "start index {} is not aligned to {block}",
                decoded.data_start_index
            ));
        }
        let fits = decoded
            .data_start_index
            .checked_add(block)
            .is_some_and(|end| end <= 1u64 << depths.data);
        if !fits {
            return Err("batch leaves exceed the data tree".to_string());
        }
        if decoded.roots_index() >= 1u64 << depths.roots {
            return Err("roots tree is full".to_string());
        }

        for (slot, record) in decoded.inner_proofs.iter().enumerate() {
            for nullifier in record.nullifiers() {
                if !digest_is_zero(&nullifier) && nullifier_index(&nullifier, depths.nullifier) == 0 {
                    return Err(format!(
                        "nullifier {} in slot {slot} maps to the reserved index 0",
                        digest_to_hex(&nullifier)
                    ));
                }
            }
        }

        self.check_inner_proofs(decoded, &parts.inner_proofs)?;

        let proof = winter_verifier::Proof::from_bytes(parts.stark_proof)
            .map_err(|e| format!("malformed STARK proof: {e}"))?;

        let schedule = UpdateSchedule::new(decoded, depths);
        let trace_info = proof.trace_info();
        if trace_info.width() != TRACE_WIDTH || trace_info.length() != schedule.trace_length() {
            return Err(format!(
                "trace shape {}x{} does not match the batch ({}x{})",
                trace_info.width(),
                trace_info.length(),
                TRACE_WIDTH,
                schedule.trace_length()
            ));
        }

        let pub_inputs = RollupPublicInputs::new(decoded.clone(), depths.clone());
        let acceptable = AcceptableOptions::OptionSet(self.acceptable_options.clone());
        verify::<RollupAir, Hasher, RandCoin, VectorCommit>(proof, pub_inputs, &acceptable)
            .map_err(|e| e.to_string())
    }

    /// Every slot must carry a proof of exactly its public record that the
    /// inner proof system accepts under the key for the record's kind
    fn check_inner_proofs(&self, decoded: &RollupResult, inner_proofs: &[&[u8]]) -> Result<(), String> {
        if inner_proofs.len() != decoded.width {
            return Err(format!(
                "{} inner proofs for a batch of width {}",
                inner_proofs.len(),
                decoded.width
            ));
        }

        let circuit = &self.circuit;
        decoded
            .inner_proofs
            .par_iter()
            .zip(inner_proofs.par_iter())
            .enumerate()
            .try_for_each(|(slot, (record, bytes))| {
                let proof = decode_inner_proof(bytes, record.kind)
                    .map_err(|e| format!("inner proof of slot {slot} is malformed: {e}"))?;
                if proof.record != *record {
                    return Err(format!(
                        "inner proof of slot {slot} does not match the slot's public inputs"
                    ));
                }
                let vk = circuit.verification_keys.for_kind(record.kind);
                if !circuit.inner_system.verify(bytes, vk) {
                    return Err(format!("inner {} proof of slot {slot} rejected", record.kind));
                }
                Ok(())
            })
    }
}
