//! Rollup trace construction
//!
//! Every scheduled update is replayed from its assembly witness: the old
//! chain folds the empty leaf and the new chain folds the written leaf up the
//! same path. Update cycles are hashed in parallel and laid out in schedule
//! order; the cycles after the last update keep both chains running with a
//! zero sibling.

use rayon::prelude::*;
use rollup_stark_air::HASH_CYCLE_LEN;
use rollup_stark_inner::NUM_ASSETS;
use rollup_stark_primitives::rescue::{apply_round, node_input_state, state_zero, RescueState};
use rollup_stark_primitives::{digest_is_zero, Digest, Felt, DIGEST_SIZE, DIGEST_ZERO, FELT_ZERO};
use winter_prover::{Trace, TraceTable};

use crate::air::schedule::{ScheduledUpdate, UpdateSchedule};
use crate::air::trace_layout::{cols, TRACE_WIDTH};
use crate::assembler::RollupBatch;
use crate::config::TreeDepths;
use crate::error::{ProofError, ProofResult};
use crate::state::{LeafUpdate, StateRoots, TreeId};

/// Both chains' states over one hash cycle
#[derive(Debug, Clone)]
struct CycleStates {
    old: [RescueState; HASH_CYCLE_LEN],
    new: [RescueState; HASH_CYCLE_LEN],
    sibling: Digest,
}

impl CycleStates {
    fn old_output(&self) -> Digest {
        output(&self.old[HASH_CYCLE_LEN - 1])
    }

    fn new_output(&self) -> Digest {
        output(&self.new[HASH_CYCLE_LEN - 1])
    }
}

fn output(state: &RescueState) -> Digest {
    [state[0], state[1], state[2], state[3]]
}

/// Rows of one permutation starting from `input`
fn hash_cycle(input: RescueState) -> [RescueState; HASH_CYCLE_LEN] {
    let mut rows = [input; HASH_CYCLE_LEN];
    for round in 0..HASH_CYCLE_LEN - 1 {
        let mut state = rows[round];
        apply_round(&mut state, round);
        rows[round + 1] = state;
    }
    rows
}

fn ordered_input(node: &Digest, sibling: &Digest, is_right: bool) -> RescueState {
    if is_right {
        node_input_state(sibling, node)
    } else {
        node_input_state(node, sibling)
    }
}

/// Builder for rollup execution traces
pub struct RollupTraceBuilder<'a> {
    batch: &'a RollupBatch,
    schedule: UpdateSchedule,
}

impl<'a> RollupTraceBuilder<'a> {
    pub fn new(batch: &'a RollupBatch, depths: &TreeDepths) -> Self {
        let schedule = UpdateSchedule::new(&batch.result(), depths);
        Self { batch, schedule }
    }

    pub fn schedule(&self) -> &UpdateSchedule {
        &self.schedule
    }

    pub fn trace_length(&self) -> usize {
        self.schedule.trace_length()
    }

    /// Build the execution trace
    pub fn build(&self) -> ProofResult<TraceTable<Felt>> {
        let witnesses: Vec<&LeafUpdate> = self.batch.updates().collect();
        let scheduled = self.schedule.updates();
        if witnesses.len() != scheduled.len() {
            return Err(ProofError::InvalidWitness(format!(
                "batch witnesses {} updates, schedule has {}",
                witnesses.len(),
                scheduled.len()
            )));
        }

        self.check_root_sequence(&witnesses)?;

        let update_cycles = scheduled
            .par_iter()
            .zip(witnesses.par_iter())
            .enumerate()
            .map(|(position, (update, witness))| update_cycles(position, update, witness))
            .collect::<ProofResult<Vec<_>>>()?;

        let cycles = self.lay_out_cycles(update_cycles);
        let trace = self.fill_columns(&cycles);
        let table = TraceTable::init(trace);
        debug_assert_eq!(table.main_trace_width(), TRACE_WIDTH);

        Ok(table)
    }

    /// Every update must start from the root the previous one left behind
    fn check_root_sequence(&self, witnesses: &[&LeafUpdate]) -> ProofResult<()> {
        let mut running = self.batch.old_roots;
        for (position, witness) in witnesses.iter().enumerate() {
            let root = running_root_mut(&mut running, witness.tree);
            if *root != witness.old_root {
                return Err(ProofError::InvalidWitness(format!(
                    "update {position} on the {} tree does not start from the running root",
                    witness.tree
                )));
            }
            *root = witness.new_root;
        }
        if running != self.batch.new_roots {
            return Err(ProofError::InvalidWitness(
                "updates do not reach the batch's new roots".to_string(),
            ));
        }
        Ok(())
    }

    /// Preamble, update cycles in schedule order, then idle cycles
    fn lay_out_cycles(&self, update_cycles: Vec<Vec<CycleStates>>) -> Vec<CycleStates> {
        let num_cycles = self.schedule.num_cycles();
        let mut cycles = Vec::with_capacity(num_cycles);

        let preamble = hash_cycle(state_zero());
        cycles.push(CycleStates {
            old: preamble,
            new: preamble,
            sibling: DIGEST_ZERO,
        });
        for update in update_cycles {
            cycles.extend(update);
        }

        while cycles.len() < num_cycles {
            let (old_node, new_node) = match cycles.last() {
                Some(last) => (last.old_output(), last.new_output()),
                None => (DIGEST_ZERO, DIGEST_ZERO),
            };
            cycles.push(CycleStates {
                old: hash_cycle(node_input_state(&old_node, &DIGEST_ZERO)),
                new: hash_cycle(node_input_state(&new_node, &DIGEST_ZERO)),
                sibling: DIGEST_ZERO,
            });
        }

        cycles
    }

    fn fill_columns(&self, cycles: &[CycleStates]) -> Vec<Vec<Felt>> {
        let length = self.schedule.trace_length();
        let mut trace = vec![vec![FELT_ZERO; length]; TRACE_WIDTH];

        // Hash states and siblings
        for (cycle, states) in cycles.iter().enumerate() {
            let base = cycle * HASH_CYCLE_LEN;
            for step in 0..HASH_CYCLE_LEN {
                let row = base + step;
                for i in 0..states.old[step].len() {
                    trace[cols::old_state(i)][row] = states.old[step][i];
                    trace[cols::new_state(i)][row] = states.new[step][i];
                }
                for i in 0..DIGEST_SIZE {
                    trace[cols::sibling(i)][row] = states.sibling[i];
                }
            }
        }

        // Schedule columns hold their per-cycle value on every row
        let columns = self.schedule.cycle_columns();
        for (column, values) in columns.by_column() {
            for (cycle, value) in values.iter().enumerate() {
                let base = cycle * HASH_CYCLE_LEN;
                trace[column][base..base + HASH_CYCLE_LEN].fill(*value);
            }
        }

        // Running roots move on entering an update's end cycle
        let mut roots = self.batch.old_roots;
        let mut fees = [FELT_ZERO; NUM_ASSETS];
        for cycle in 0..cycles.len() {
            for tree in TreeId::ALL {
                if cycle > 0 && columns.end_flags(tree)[cycle] != FELT_ZERO {
                    *running_root_mut(&mut roots, tree) = cycles[cycle - 1].new_output();
                }
            }
            for (asset, fee) in fees.iter_mut().enumerate() {
                *fee += columns.fee_inc[asset][cycle];
            }

            let base = cycle * HASH_CYCLE_LEN;
            for row in base..base + HASH_CYCLE_LEN {
                for tree in TreeId::ALL {
                    let root = roots.get(tree);
                    for (i, limb) in root.iter().enumerate() {
                        trace[cols::root(tree) + i][row] = *limb;
                    }
                }
                for (asset, fee) in fees.iter().enumerate() {
                    trace[cols::fee(asset)][row] = *fee;
                }
            }
        }

        trace
    }
}

fn running_root_mut(roots: &mut StateRoots, tree: TreeId) -> &mut Digest {
    match tree {
        TreeId::Data => &mut roots.data,
        TreeId::Nullifier => &mut roots.nullifier,
        TreeId::Roots => &mut roots.roots,
    }
}

/// Hash cycles of one update, checked against its witness
fn update_cycles(
    position: usize,
    update: &ScheduledUpdate,
    witness: &LeafUpdate,
) -> ProofResult<Vec<CycleStates>> {
    let invalid = |reason: &str| {
        ProofError::InvalidWitness(format!(
            "update {position} ({} tree, index {}): {reason}",
            update.tree, update.index
        ))
    };

    if witness.tree != update.tree || witness.index != update.index {
        return Err(invalid("witness targets a different leaf"));
    }
    if witness.new_leaf != update.leaf {
        return Err(invalid("witness writes a different leaf"));
    }
    if !digest_is_zero(&witness.old_leaf) {
        return Err(invalid("leaf is not empty before the write"));
    }
    if witness.path.depth() != update.depth {
        return Err(invalid("path depth does not match the tree"));
    }

    let mut old_node = DIGEST_ZERO;
    let mut new_node = update.leaf;
    let mut cycles = Vec::with_capacity(update.depth);
    for (level, sibling) in witness.path.siblings.iter().enumerate() {
        let is_right = witness.path.is_right(level);
        let states = CycleStates {
            old: hash_cycle(ordered_input(&old_node, sibling, is_right)),
            new: hash_cycle(ordered_input(&new_node, sibling, is_right)),
            sibling: *sibling,
        };
        old_node = states.old_output();
        new_node = states.new_output();
        cycles.push(states);
    }

    if old_node != witness.old_root {
        return Err(invalid("path does not open the old root"));
    }
    if new_node != witness.new_root {
        return Err(invalid("path does not reach the new root"));
    }

    Ok(cycles)
}
