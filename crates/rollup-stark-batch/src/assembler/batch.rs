//! Batch assembly against the world state
//!
//! Assembly decodes the submitted proofs, pads to the resolved width and
//! witnesses every leaf write against a fork of the state, slot by slot. The
//! live state is not touched; the result carries a [`StateTransition`] that
//! the caller commits once the batch is accepted.

use std::time::Instant;

use rayon::prelude::*;
use rollup_stark_inner::{decode_raw, InnerProof, InnerProofRecord, RawInnerProof, NUM_ASSETS};
use rollup_stark_primitives::{digest_is_zero, digest_to_hex, Digest, GOLDILOCKS_PRIME};
use tracing::{debug, info};

use crate::assembler::width::aligned_start_index;
use crate::codec::RollupResult;
use crate::config::RollupCircuitData;
use crate::error::{BatchError, BatchResult, StateError, TreeError};
use crate::state::{
    LeafUpdate, LeafWrite, StateRoots, StateTransition, TreeId, WorldState,
};

/// Witness of one slot
#[derive(Debug, Clone)]
pub struct SlotWitness {
    pub slot: usize,
    pub proof: InnerProof,
    pub is_padding: bool,
    /// Data-tree writes at `start + 2 * slot` and `start + 2 * slot + 1`
    pub note_updates: [LeafUpdate; 2],
    /// Nullifier writes; a zero nullifier is a no-op write at index 0
    pub nullifier_updates: [LeafUpdate; 2],
}

impl SlotWitness {
    pub fn record(&self) -> &InnerProofRecord {
        &self.proof.record
    }

    /// Updates in the order the circuit applies them
    pub fn updates(&self) -> impl Iterator<Item = &LeafUpdate> {
        self.note_updates.iter().chain(self.nullifier_updates.iter())
    }
}

/// An assembled batch, ready to be proven
#[derive(Debug, Clone)]
pub struct RollupBatch {
    pub batch_id: u64,
    pub requested_width: usize,
    pub width: usize,
    pub data_start_index: u64,
    pub old_roots: StateRoots,
    pub new_roots: StateRoots,
    /// Roots-tree index receiving the new data root
    pub roots_index: u64,
    pub total_fees: [u64; NUM_ASSETS],
    pub slots: Vec<SlotWitness>,
    pub root_update: LeafUpdate,
    pub transition: StateTransition,
}

impl RollupBatch {
    /// Number of submitted (non-padding) proofs
    pub fn num_real(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_padding).count()
    }

    pub fn records(&self) -> impl Iterator<Item = &InnerProofRecord> {
        self.slots.iter().map(SlotWitness::record)
    }

    /// Every leaf update in circuit order, ending with the roots-tree append
    pub fn updates(&self) -> impl Iterator<Item = &LeafUpdate> {
        self.slots
            .iter()
            .flat_map(SlotWitness::updates)
            .chain(std::iter::once(&self.root_update))
    }

    /// Public inputs the rollup proof exposes
    pub fn result(&self) -> RollupResult {
        RollupResult {
            batch_id: self.batch_id,
            width: self.width,
            data_start_index: self.data_start_index,
            old_data_root: self.old_roots.data,
            new_data_root: self.new_roots.data,
            old_nullifier_root: self.old_roots.nullifier,
            new_nullifier_root: self.new_roots.nullifier,
            old_roots_root: self.old_roots.roots,
            new_roots_root: self.new_roots.roots,
            total_fees: self.total_fees,
            inner_proofs: self.records().cloned().collect(),
        }
    }

    /// Apply the batch's state changes
    pub fn commit_to(&self, state: &mut WorldState) -> Result<(), StateError> {
        state.commit(&self.transition)
    }
}

/// Builds batches for one rollup circuit
pub struct BatchAssembler<'a> {
    circuit: &'a RollupCircuitData,
}

impl<'a> BatchAssembler<'a> {
    pub fn new(circuit: &'a RollupCircuitData) -> Self {
        Self { circuit }
    }

    pub fn build_batch(
        &self,
        state: &WorldState,
        requested_width: usize,
        proofs: &[RawInnerProof],
    ) -> BatchResult<RollupBatch> {
        let start = Instant::now();
        let config = &self.circuit.config;

        if requested_width == 0 || proofs.is_empty() {
            return Err(BatchError::EmptyBatch);
        }
        let too_large = || BatchError::BatchTooLarge {
            count: proofs.len(),
            requested: requested_width,
            max: config.max_width(),
        };
        let width = config.resolve_width(requested_width).ok_or_else(too_large)?;
        if proofs.len() > width {
            return Err(too_large());
        }

        let decoded = proofs
            .par_iter()
            .enumerate()
            .map(|(slot, raw)| {
                decode_raw(raw).map_err(|source| BatchError::MalformedProof { slot, source })
            })
            .collect::<BatchResult<Vec<_>>>()?;
        let padding = decode_raw(&self.circuit.padding_proof)
            .map_err(|e| BatchError::InvalidPaddingProof(e.to_string()))?;

        let data_start_index = aligned_start_index(state.data_size(), width);
        let data_end = data_start_index + 2 * width as u64;
        let data_capacity = 1u64 << state.depths().data;
        if data_end > data_capacity {
            return Err(TreeError::OutOfRange {
                index: data_end - 1,
                depth: state.depths().data,
            }
            .into());
        }

        let batch_id = state.next_batch_id();
        let roots_index = batch_id + 1;

        debug!(
            batch_id,
            width,
            real = decoded.len(),
            data_start_index,
            "assembling batch"
        );

        let mut fork = state.fork();
        let mut fee_sums = [0u128; NUM_ASSETS];
        let mut slots = Vec::with_capacity(width);
        let mut real = decoded.into_iter();

        for slot in 0..width {
            let (proof, is_padding) = match real.next() {
                Some(proof) => (proof, false),
                None => (padding.clone(), true),
            };
            let witness = witness_slot(&mut fork, slot, data_start_index, proof, is_padding)?;
            if !is_padding {
                let record = witness.record();
                fee_sums[record.asset_id as usize] += record.tx_fee as u128;
            }
            slots.push(witness);
        }

        let mut total_fees = [0u64; NUM_ASSETS];
        for (asset_id, (total, sum)) in total_fees.iter_mut().zip(fee_sums).enumerate() {
            if sum >= GOLDILOCKS_PRIME as u128 {
                return Err(BatchError::FeeOverflow { asset_id });
            }
            *total = sum as u64;
        }

        let new_data_root = fork.data_root();
        let root_update = fork.write_with_witness(TreeId::Roots, roots_index, new_data_root)?;
        fork.reserve_data(data_end)?;

        let old_roots = state.roots();
        let new_roots = fork.roots();

        let writes = slots
            .iter()
            .flat_map(SlotWitness::updates)
            .chain(std::iter::once(&root_update))
            .filter(|u| !u.is_noop())
            .map(|u| LeafWrite {
                tree: u.tree,
                index: u.index,
                leaf: u.new_leaf,
            })
            .collect();

        let transition = StateTransition {
            base_version: state.version(),
            old_roots,
            new_roots,
            writes,
            new_data_size: data_end,
        };

        let batch = RollupBatch {
            batch_id,
            requested_width,
            width,
            data_start_index,
            old_roots,
            new_roots,
            roots_index,
            total_fees,
            slots,
            root_update,
            transition,
        };

        info!(
            batch_id,
            width,
            real = batch.num_real(),
            new_data_root = %digest_to_hex(&new_roots.data),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "assembled batch"
        );

        Ok(batch)
    }
}

/// Build a batch against `state` without mutating it
pub fn build_batch(
    state: &WorldState,
    circuit: &RollupCircuitData,
    requested_width: usize,
    proofs: &[RawInnerProof],
) -> BatchResult<RollupBatch> {
    BatchAssembler::new(circuit).build_batch(state, requested_width, proofs)
}

fn witness_slot(
    fork: &mut WorldState,
    slot: usize,
    data_start_index: u64,
    proof: InnerProof,
    is_padding: bool,
) -> BatchResult<SlotWitness> {
    let notes = proof.record.notes();
    let first = data_start_index + 2 * slot as u64;
    let note_updates = [
        fork.write_with_witness(TreeId::Data, first, notes[0])?,
        fork.write_with_witness(TreeId::Data, first + 1, notes[1])?,
    ];

    let nullifiers = proof.record.nullifiers();
    let nullifier_updates = [
        witness_nullifier(fork, slot, nullifiers[0])?,
        witness_nullifier(fork, slot, nullifiers[1])?,
    ];

    debug!(
        slot,
        kind = %proof.kind(),
        is_padding,
        data_index = first,
        "witnessed slot"
    );

    Ok(SlotWitness {
        slot,
        proof,
        is_padding,
        note_updates,
        nullifier_updates,
    })
}

fn witness_nullifier(
    fork: &mut WorldState,
    slot: usize,
    nullifier: Digest,
) -> BatchResult<LeafUpdate> {
    if digest_is_zero(&nullifier) {
        return Ok(fork.write_with_witness(TreeId::Nullifier, 0, nullifier)?);
    }

    let index = fork.nullifiers().index_of(&nullifier);
    if index == 0 {
        return Err(BatchError::ReservedNullifierIndex {
            slot,
            nullifier: digest_to_hex(&nullifier),
        });
    }
    if !fork.nullifiers().is_free(&nullifier) {
        return Err(BatchError::DoubleSpend {
            slot,
            nullifier: digest_to_hex(&nullifier),
        });
    }
    Ok(fork.write_with_witness(TreeId::Nullifier, index, nullifier)?)
}
