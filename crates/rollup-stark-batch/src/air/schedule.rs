//! Update schedule of a rollup trace
//!
//! The schedule is a pure function of the public inputs: both prover and
//! verifier derive the same sequence of tree updates, their cycle ranges and
//! the per-cycle values bound by sequence assertions.

use std::array;

use rollup_stark_air::HASH_CYCLE_LEN;
use rollup_stark_inner::NUM_ASSETS;
use rollup_stark_primitives::{felt_from_u64, Digest, Felt, DIGEST_SIZE, FELT_ONE, FELT_ZERO};

use crate::air::trace_layout::{cols, MIN_TRACE_LENGTH};
use crate::codec::RollupResult;
use crate::config::TreeDepths;
use crate::state::{nullifier_index, TreeId};

/// One Merkle update in the trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledUpdate {
    pub tree: TreeId,
    pub index: u64,
    pub leaf: Digest,
    pub depth: usize,
    /// Cycle absorbing the leaf
    pub first_cycle: usize,
    /// `(asset, fee)` added when entering `first_cycle`
    pub fee: Option<(usize, u64)>,
}

impl ScheduledUpdate {
    /// Cycle whose first row sees the update's final roots
    pub fn end_cycle(&self) -> usize {
        self.first_cycle + self.depth
    }
}

#[derive(Debug, Clone)]
pub struct UpdateSchedule {
    updates: Vec<ScheduledUpdate>,
    trace_length: usize,
}

impl UpdateSchedule {
    pub fn new(result: &RollupResult, depths: &TreeDepths) -> Self {
        let mut updates = Vec::with_capacity(4 * result.inner_proofs.len() + 1);
        // Cycle 0 is a preamble so the first update has a previous cycle
        let mut cycle = 1;

        let mut push = |tree: TreeId, index: u64, leaf: Digest, depth: usize, fee: Option<(usize, u64)>| {
            updates.push(ScheduledUpdate {
                tree,
                index,
                leaf,
                depth,
                first_cycle: cycle,
                fee,
            });
            cycle += depth;
        };

        for (slot, record) in result.inner_proofs.iter().enumerate() {
            let first = result.data_start_index + 2 * slot as u64;
            let fee = Some((record.asset_id as usize, record.tx_fee));
            push(TreeId::Data, first, record.new_note1, depths.data, fee);
            push(TreeId::Data, first + 1, record.new_note2, depths.data, None);
            for nullifier in record.nullifiers() {
                push(
                    TreeId::Nullifier,
                    nullifier_index(&nullifier, depths.nullifier),
                    nullifier,
                    depths.nullifier,
                    None,
                );
            }
        }
        push(
            TreeId::Roots,
            result.roots_index(),
            result.new_data_root,
            depths.roots,
            None,
        );

        // One more cycle carries the end flag of the last update
        let rows = (cycle + 1) * HASH_CYCLE_LEN;
        let trace_length = rows.next_power_of_two().max(MIN_TRACE_LENGTH);

        Self {
            updates,
            trace_length,
        }
    }

    pub fn updates(&self) -> &[ScheduledUpdate] {
        &self.updates
    }

    pub fn trace_length(&self) -> usize {
        self.trace_length
    }

    pub fn num_cycles(&self) -> usize {
        self.trace_length / HASH_CYCLE_LEN
    }

    /// Cycles covered by updates, preamble included
    pub fn used_cycles(&self) -> usize {
        self.updates.last().map_or(1, ScheduledUpdate::end_cycle)
    }

    /// Per-cycle values of the schedule columns
    pub fn cycle_columns(&self) -> CycleColumns {
        let n = self.num_cycles();
        let mut columns = CycleColumns {
            start: vec![FELT_ZERO; n],
            bit: vec![FELT_ZERO; n],
            new_leaf: array::from_fn(|_| vec![FELT_ZERO; n]),
            end: array::from_fn(|_| vec![FELT_ZERO; n]),
            fee_inc: array::from_fn(|_| vec![FELT_ZERO; n]),
        };

        for update in &self.updates {
            let first = update.first_cycle;
            columns.start[first] = FELT_ONE;
            for (i, limb) in update.leaf.iter().enumerate() {
                columns.new_leaf[i][first] = *limb;
            }
            for level in 0..update.depth {
                if (update.index >> level) & 1 == 1 {
                    columns.bit[first + level] = FELT_ONE;
                }
            }
            columns.end[tree_position(update.tree)][update.end_cycle()] = FELT_ONE;
            if let Some((asset, fee)) = update.fee {
                columns.fee_inc[asset][first] = felt_from_u64(fee);
            }
        }
        columns
    }
}

/// Schedule columns sampled once per cycle
#[derive(Debug, Clone)]
pub struct CycleColumns {
    pub start: Vec<Felt>,
    pub bit: Vec<Felt>,
    pub new_leaf: [Vec<Felt>; DIGEST_SIZE],
    /// Indexed in [`TreeId::ALL`] order
    pub end: [Vec<Felt>; 3],
    pub fee_inc: [Vec<Felt>; NUM_ASSETS],
}

impl CycleColumns {
    pub fn end_flags(&self, tree: TreeId) -> &[Felt] {
        &self.end[tree_position(tree)]
    }

    /// `(trace column, per-cycle values)` for every schedule column
    pub fn by_column(&self) -> Vec<(usize, &[Felt])> {
        let mut columns: Vec<(usize, &[Felt])> = Vec::with_capacity(5 + DIGEST_SIZE + NUM_ASSETS);
        columns.push((cols::START, self.start.as_slice()));
        columns.push((cols::BIT, self.bit.as_slice()));
        for (i, values) in self.new_leaf.iter().enumerate() {
            columns.push((cols::new_leaf(i), values.as_slice()));
        }
        for tree in TreeId::ALL {
            columns.push((cols::end_flag(tree), self.end_flags(tree)));
        }
        for (asset, values) in self.fee_inc.iter().enumerate() {
            columns.push((cols::fee_inc(asset), values.as_slice()));
        }
        columns
    }
}

fn tree_position(tree: TreeId) -> usize {
    match tree {
        TreeId::Data => 0,
        TreeId::Nullifier => 1,
        TreeId::Roots => 2,
    }
}
