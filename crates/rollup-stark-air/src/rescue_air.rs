//! Rescue-Prime AIR gadget
//!
//! Hashes are laid out as 8-row cycles: row 0 holds the sponge input, rows
//! 1..=7 the state after each round. Round `r` is checked on the transition
//! from row `r` to row `r + 1`; the transition out of row 7 belongs to the
//! enclosing AIR (absorbing the next input).
//!
//! Round constants and the two cycle masks are supplied to the AIR as
//! periodic columns of length [`HASH_CYCLE_LEN`].

use rollup_stark_primitives::rescue::{
    round_constants, round_residual, NUM_ROUNDS, STATE_WIDTH,
};
use rollup_stark_primitives::{Felt, FELT_ONE, FELT_ZERO};
use winter_air::TransitionConstraintDegree;
use winter_math::FieldElement;

/// Rows per hash cycle
pub const HASH_CYCLE_LEN: usize = NUM_ROUNDS + 1;

/// Number of periodic columns produced by [`periodic_columns`]
pub const NUM_PERIODIC_COLUMNS: usize = 2 + 2 * STATE_WIDTH;

/// Index of the round mask (1 on rows 0..=6 of a cycle)
pub const ROUND_MASK: usize = 0;

/// Index of the absorb mask (1 on row 7 of a cycle)
pub const ABSORB_MASK: usize = 1;

/// Index of the first forward-half constant column (C1)
pub const ARK1_START: usize = 2;

/// Index of the first backward-half constant column (C2)
pub const ARK2_START: usize = ARK1_START + STATE_WIDTH;

/// Periodic columns: round mask, absorb mask, C1[0..12], C2[0..12]
pub fn periodic_columns() -> Vec<Vec<Felt>> {
    let ark = round_constants();
    let mut columns = Vec::with_capacity(NUM_PERIODIC_COLUMNS);

    let mut round_mask = vec![FELT_ONE; HASH_CYCLE_LEN];
    round_mask[NUM_ROUNDS] = FELT_ZERO;
    let mut absorb_mask = vec![FELT_ZERO; HASH_CYCLE_LEN];
    absorb_mask[NUM_ROUNDS] = FELT_ONE;
    columns.push(round_mask);
    columns.push(absorb_mask);

    for half in 0..2 {
        for i in 0..STATE_WIDTH {
            let mut column = vec![FELT_ZERO; HASH_CYCLE_LEN];
            for (round, value) in column.iter_mut().take(NUM_ROUNDS).enumerate() {
                *value = ark[2 * round + half][i];
            }
            columns.push(column);
        }
    }

    columns
}

/// Degrees of the [`STATE_WIDTH`] round constraints for one hashed state
pub fn round_constraint_degrees() -> Vec<TransitionConstraintDegree> {
    (0..STATE_WIDTH)
        .map(|_| TransitionConstraintDegree::with_cycles(ALPHA_DEGREE, vec![HASH_CYCLE_LEN]))
        .collect()
}

/// S-box degree as seen by the constraint system
const ALPHA_DEGREE: usize = 7;

/// Evaluate the round constraints for one state, masked to round rows
///
/// `cur` and `next` are the 12 state columns on consecutive rows; `periodic`
/// is the full periodic value slice in [`periodic_columns`] order.
pub fn evaluate_rounds<E: FieldElement<BaseField = Felt>>(
    cur: &[E],
    next: &[E],
    periodic: &[E],
    result: &mut [E],
) {
    let mask = periodic[ROUND_MASK];
    round_residual(
        cur,
        next,
        &periodic[ARK1_START..ARK1_START + STATE_WIDTH],
        &periodic[ARK2_START..ARK2_START + STATE_WIDTH],
        result,
    );
    for r in result.iter_mut().take(STATE_WIDTH) {
        *r *= mask;
    }
}
