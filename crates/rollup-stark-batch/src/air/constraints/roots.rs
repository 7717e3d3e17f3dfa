//! Running-root constraints
//!
//! When an update of a tree ends, its old chain must have landed on the
//! tree's running root and the running root becomes the new chain's output.
//! At every other step the running roots are constant.

use rollup_stark_air::HASH_CYCLE_LEN;
use rollup_stark_primitives::{Felt, DIGEST_SIZE};
use winter_air::TransitionConstraintDegree;
use winter_math::FieldElement;

use crate::air::trace_layout::cols;
use crate::state::TreeId;

/// Two constraints per root limb for each of the three trees
pub const NUM_ROOT_CONSTRAINTS: usize = 2 * DIGEST_SIZE * TreeId::ALL.len();

pub fn root_constraint_degrees() -> Vec<TransitionConstraintDegree> {
    (0..NUM_ROOT_CONSTRAINTS)
        .map(|_| TransitionConstraintDegree::with_cycles(2, vec![HASH_CYCLE_LEN]))
        .collect()
}

pub fn evaluate_root_constraints<E: FieldElement<BaseField = Felt>>(
    current: &[E],
    next: &[E],
    absorb: E,
    result: &mut [E],
) -> usize {
    let mut idx = 0;

    for tree in TreeId::ALL {
        let gate = absorb * next[cols::end_flag(tree)];
        let root = cols::root(tree);

        for i in 0..DIGEST_SIZE {
            let running = current[root + i];

            // next root is the new-chain output at an update end, else unchanged
            result[idx] = next[root + i] - running - gate * (current[cols::new_state(i)] - running);
            idx += 1;

            // the old chain proves the pre-update root
            result[idx] = gate * (current[cols::old_state(i)] - running);
            idx += 1;
        }
    }

    idx
}
