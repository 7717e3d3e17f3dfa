//! Rollup prover
//!
//! Checks every slot's inner proof against its verification key, builds the
//! dual-chain trace for the batch and proves it with winterfell. The output
//! bytes carry the public inputs and every slot's inner proof in front of the
//! STARK proof, so a verifier can decode the batch result and re-check the
//! inner proofs without any side channel.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use winter_air::TraceInfo;
use winter_crypto::{hashers::Blake3_256, DefaultRandomCoin, MerkleTree};
use winter_prover::{Prover, Trace, TraceTable};

use rollup_stark_air::ProofOptions;
use rollup_stark_primitives::{Felt, Hash256};

use crate::air::{RollupAir, MIN_BLOWUP_FACTOR};
use crate::assembler::RollupBatch;
use crate::codec::{encode_proof_bytes, RollupResult};
use crate::config::RollupCircuitData;
use crate::error::{ProofError, ProofResult};
use crate::prover::rollup_trace::RollupTraceBuilder;
use crate::public_inputs::RollupPublicInputs;

/// Type alias for the hash function used
pub type Hasher = Blake3_256<Felt>;

/// Type alias for the random coin
pub type RandCoin = DefaultRandomCoin<Hasher>;

/// Type alias for vector commitment
pub type VectorCommit = MerkleTree<Hasher>;

const PROOF_HASH_DOMAIN: &[u8] = b"ROLLUP_STARK_BATCH_PROOF_HASH_V1";

/// A generated rollup proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupProof {
    /// Public inputs followed by the STARK proof
    #[serde(with = "serde_bytes")]
    pub proof_bytes: Vec<u8>,

    /// Hash of `proof_bytes` (hex)
    pub proof_hash: String,

    /// The public inputs the proof attests to
    pub result: RollupResult,

    pub metadata: RollupProofMetadata,
}

/// Metadata about proof generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupProofMetadata {
    pub batch_id: u64,

    /// Resolved width
    pub width: usize,

    /// Slots holding submitted proofs
    pub num_real_txs: usize,

    /// Time taken to generate the proof (milliseconds)
    pub proving_time_ms: u64,

    pub trace_length: usize,

    /// Size of `proof_bytes`
    pub proof_size: usize,

    pub prover_version: String,
}

impl RollupProof {
    /// Compute the proof hash using the domain separator
    pub fn compute_hash(proof_bytes: &[u8]) -> Hash256 {
        Hash256::sha256_with_domain(PROOF_HASH_DOMAIN, proof_bytes)
    }

    /// Whether `proof_hash` matches the bytes
    pub fn hash_matches(&self) -> bool {
        Self::compute_hash(&self.proof_bytes).to_hex() == self.proof_hash
    }
}

/// Proves batches for one rollup circuit
#[derive(Debug, Clone)]
pub struct RollupProver {
    circuit: Arc<RollupCircuitData>,
}

impl RollupProver {
    pub fn new(circuit: Arc<RollupCircuitData>) -> Self {
        Self { circuit }
    }

    pub fn circuit(&self) -> &RollupCircuitData {
        &self.circuit
    }

    /// Generate a proof for an assembled batch
    pub fn prove(&self, batch: &RollupBatch) -> ProofResult<RollupProof> {
        let start = Instant::now();
        let config = &self.circuit.config;

        config.proof_options.validate_for_blowup(MIN_BLOWUP_FACTOR)?;
        if !config.supports_width(batch.width) {
            return Err(ProofError::UnsupportedWidth(batch.width));
        }
        if batch.slots.len() != batch.width {
            return Err(ProofError::InvalidWitness(format!(
                "batch of width {} carries {} slots",
                batch.width,
                batch.slots.len()
            )));
        }

        self.verify_inner_proofs(batch)?;
        self.prove_slots(batch, start)
    }

    /// Build and prove the trace, trusting the batch's inner proofs
    fn prove_slots(&self, batch: &RollupBatch, start: Instant) -> ProofResult<RollupProof> {
        let config = &self.circuit.config;
        let trace = RollupTraceBuilder::new(batch, &config.depths).build()?;
        let trace_length = trace.length();
        debug!(batch_id = batch.batch_id, trace_length, "built rollup trace");

        let result = batch.result();
        let pub_inputs = RollupPublicInputs::new(result.clone(), config.depths.clone());
        let prover = WinterRollupProver::try_new(&config.proof_options, pub_inputs)?;

        let proof = prover
            .prove(trace)
            .map_err(|e| ProofError::ProofConstruction(e.to_string()))?;

        let inner_proofs: Vec<&[u8]> = batch.slots.iter().map(|slot| slot.proof.data.as_slice()).collect();
        let proof_bytes = encode_proof_bytes(&result, &inner_proofs, &proof.to_bytes());
        let proof_hash = RollupProof::compute_hash(&proof_bytes);
        let proving_time = start.elapsed();

        info!(
            batch_id = batch.batch_id,
            width = batch.width,
            trace_length,
            proof_size = proof_bytes.len(),
            proving_time_ms = proving_time.as_millis() as u64,
            "proved rollup batch"
        );

        Ok(RollupProof {
            proof_hash: proof_hash.to_hex(),
            result,
            metadata: RollupProofMetadata {
                batch_id: batch.batch_id,
                width: batch.width,
                num_real_txs: batch.num_real(),
                proving_time_ms: proving_time.as_millis() as u64,
                trace_length,
                proof_size: proof_bytes.len(),
                prover_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            proof_bytes,
        })
    }

    /// Check every slot, padding included, against the key for its kind
    fn verify_inner_proofs(&self, batch: &RollupBatch) -> ProofResult<()> {
        let circuit = &self.circuit;
        batch.slots.par_iter().try_for_each(|slot| {
            let kind = slot.proof.kind();
            let vk = circuit.verification_keys.for_kind(kind);
            if circuit.inner_system.verify(&slot.proof.data, vk) {
                Ok(())
            } else {
                warn!(slot = slot.slot, %kind, "inner proof rejected");
                Err(ProofError::InnerProofRejected {
                    slot: slot.slot,
                    kind,
                })
            }
        })
    }
}

/// Prove a batch against a circuit
pub fn prove(batch: &RollupBatch, circuit: Arc<RollupCircuitData>) -> ProofResult<RollupProof> {
    RollupProver::new(circuit).prove(batch)
}

/// Internal Winterfell prover implementation for rollup proofs
struct WinterRollupProver {
    options: winter_air::ProofOptions,
    pub_inputs: RollupPublicInputs,
}

impl WinterRollupProver {
    fn try_new(options: &ProofOptions, pub_inputs: RollupPublicInputs) -> ProofResult<Self> {
        Ok(Self {
            options: options.try_to_winterfell()?,
            pub_inputs,
        })
    }
}

impl Prover for WinterRollupProver {
    type BaseField = Felt;
    type Air = RollupAir;
    type Trace = TraceTable<Felt>;
    type HashFn = Hasher;
    type RandomCoin = RandCoin;
    type VC = VectorCommit;
    type TraceLde<E: winter_math::FieldElement<BaseField = Felt>> =
        winter_prover::DefaultTraceLde<E, Self::HashFn, Self::VC>;
    type ConstraintEvaluator<'a, E: winter_math::FieldElement<BaseField = Felt>> =
        winter_prover::DefaultConstraintEvaluator<'a, Self::Air, E>;
    type ConstraintCommitment<E: winter_math::FieldElement<BaseField = Felt>> =
        winter_prover::DefaultConstraintCommitment<E, Self::HashFn, Self::VC>;

    fn get_pub_inputs(&self, _trace: &Self::Trace) -> RollupPublicInputs {
        self.pub_inputs.clone()
    }

    fn options(&self) -> &winter_air::ProofOptions {
        &self.options
    }

    fn new_trace_lde<E: winter_math::FieldElement<BaseField = Felt>>(
        &self,
        trace_info: &TraceInfo,
        main_trace: &winter_prover::matrix::ColMatrix<Felt>,
        domain: &winter_prover::StarkDomain<Felt>,
        partition_option: winter_air::PartitionOptions,
    ) -> (Self::TraceLde<E>, winter_prover::TracePolyTable<E>) {
        winter_prover::DefaultTraceLde::new(trace_info, main_trace, domain, partition_option)
    }

    fn new_evaluator<'a, E: winter_math::FieldElement<BaseField = Felt>>(
        &self,
        air: &'a Self::Air,
        aux_rand_elements: Option<winter_air::AuxRandElements<E>>,
        composition_coefficients: winter_air::ConstraintCompositionCoefficients<E>,
    ) -> Self::ConstraintEvaluator<'a, E> {
        winter_prover::DefaultConstraintEvaluator::new(
            air,
            aux_rand_elements,
            composition_coefficients,
        )
    }

    fn build_constraint_commitment<E: winter_math::FieldElement<BaseField = Felt>>(
        &self,
        composition_poly_trace: winter_prover::CompositionPolyTrace<E>,
        num_constraint_composition_columns: usize,
        domain: &winter_prover::StarkDomain<Felt>,
        partition_options: winter_air::PartitionOptions,
    ) -> (Self::ConstraintCommitment<E>, winter_prover::CompositionPoly<E>) {
        winter_prover::DefaultConstraintCommitment::new(
            composition_poly_trace,
            num_constraint_composition_columns,
            domain,
            partition_options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::build_batch;
    use crate::config::RollupConfig;
    use crate::state::WorldState;
    use crate::test_utils::{init_test_logging, transfer};
    use crate::verifier::verify_rollup_proof;
    use rollup_stark_inner::HashProofSystem;

    fn setup() -> (Arc<RollupCircuitData>, Arc<HashProofSystem>, WorldState) {
        init_test_logging();
        let (circuit, system) = RollupCircuitData::with_mock_system(RollupConfig::testing()).unwrap();
        let state = WorldState::new(&circuit.config.depths).unwrap();
        (Arc::new(circuit), system, state)
    }

    #[test]
    fn test_prove_and_verify_single_transfer() {
        let (circuit, system, state) = setup();
        let batch = build_batch(&state, &circuit, 1, &[transfer(&system, 1)]).unwrap();

        let proof = RollupProver::new(circuit.clone()).prove(&batch).unwrap();
        assert!(proof.hash_matches());
        assert_eq!(proof.result, batch.result());
        assert_eq!(proof.metadata.num_real_txs, 1);
        assert_eq!(proof.metadata.proof_size, proof.proof_bytes.len());

        let verification = verify_rollup_proof(&proof.proof_bytes, &circuit).unwrap();
        assert!(verification.verified, "rollup proof should verify: {:?}", verification.error);
        assert_eq!(verification.decoded, batch.result());
    }

    #[test]
    fn test_forged_inner_proof_rejected() {
        let (circuit, system, state) = setup();
        let mut forged = transfer(&system, 1);
        let last = forged.data.len() - 1;
        forged.data[last] ^= 1;
        let batch = build_batch(&state, &circuit, 2, &[forged]).unwrap();

        let err = RollupProver::new(circuit).prove(&batch).unwrap_err();
        assert!(matches!(err, ProofError::InnerProofRejected { slot: 0, .. }));
    }

    #[test]
    fn test_stark_over_forged_slot_fails_verification() {
        let (circuit, system, state) = setup();
        let mut forged = transfer(&system, 1);
        let last = forged.data.len() - 1;
        forged.data[last] ^= 1;
        let batch = build_batch(&state, &circuit, 1, &[forged]).unwrap();

        // a dishonest prover skips the inner proof checks
        let proof = RollupProver::new(circuit.clone())
            .prove_slots(&batch, Instant::now())
            .unwrap();
        assert_eq!(proof.result.total_fees, batch.total_fees);

        let verification = verify_rollup_proof(&proof.proof_bytes, &circuit).unwrap();
        assert!(!verification.verified);
        assert!(verification.error.unwrap().contains("slot 0 rejected"));
    }

    #[test]
    fn test_proof_bytes_carry_every_slot() {
        let (circuit, system, state) = setup();
        let raw = transfer(&system, 2);
        let batch = build_batch(&state, &circuit, 2, &[raw.clone()]).unwrap();
        let proof = RollupProver::new(circuit.clone()).prove(&batch).unwrap();

        let parts = crate::codec::split_proof_bytes(&proof.proof_bytes).unwrap();
        assert_eq!(parts.inner_proofs.len(), 2);
        assert_eq!(parts.inner_proofs[0], raw.data.as_slice());
        assert_eq!(parts.inner_proofs[1], circuit.padding_proof.data.as_slice());
    }

    #[test]
    fn test_corrupted_slot_bytes_rejected() {
        let (circuit, system, state) = setup();
        let batch = build_batch(&state, &circuit, 1, &[transfer(&system, 1)]).unwrap();

        let mut tampered = batch.clone();
        tampered.slots[0].proof.data.truncate(8);
        let err = RollupProver::new(circuit).prove(&tampered).unwrap_err();
        assert!(matches!(err, ProofError::InnerProofRejected { slot: 0, .. }));
    }

    #[test]
    fn test_low_blowup_rejected() {
        let (circuit, system, state) = setup();
        let batch = build_batch(&state, &circuit, 1, &[transfer(&system, 1)]).unwrap();

        let mut weak = (*circuit).clone();
        weak.config.proof_options.blowup_factor = 4;
        let err = RollupProver::new(Arc::new(weak)).prove(&batch).unwrap_err();
        assert!(matches!(err, ProofError::InvalidOptions(_)));
    }

    #[test]
    fn test_unsupported_width_rejected() {
        let (circuit, system, state) = setup();
        let batch = build_batch(&state, &circuit, 2, &[transfer(&system, 1)]).unwrap();

        let mut narrow = (*circuit).clone();
        narrow.config.supported_widths = vec![1, 4];
        let err = RollupProver::new(Arc::new(narrow)).prove(&batch).unwrap_err();
        assert!(matches!(err, ProofError::UnsupportedWidth(2)));
    }
}
