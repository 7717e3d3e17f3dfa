//! Absorb constraints of the dual-chain Merkle update
//!
//! On the last row of a cycle the next state is rebuilt from the current
//! output: `node` is the current output, or the scheduled leaf when a new
//! update starts (the empty leaf on the old chain), and the direction bit
//! orders `node` and the sibling into the rate of a fresh sponge state.

use rollup_stark_air::HASH_CYCLE_LEN;
use rollup_stark_primitives::rescue::{RATE, STATE_WIDTH};
use rollup_stark_primitives::{felt_from_u64, Felt, DIGEST_SIZE};
use winter_air::TransitionConstraintDegree;
use winter_math::FieldElement;

use crate::air::trace_layout::cols;

/// Absorb constraints per chain
pub const NUM_ABSORB_CONSTRAINTS: usize = STATE_WIDTH;

/// Which chain a set of absorb constraints applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    /// Folds the empty leaf
    Old,
    /// Folds the scheduled leaf
    New,
}

impl Chain {
    fn state(self) -> usize {
        match self {
            Chain::Old => cols::OLD_STATE,
            Chain::New => cols::NEW_STATE,
        }
    }
}

pub fn absorb_constraint_degrees() -> Vec<TransitionConstraintDegree> {
    (0..STATE_WIDTH)
        .map(|i| {
            let base = if i < RATE { 3 } else { 1 };
            TransitionConstraintDegree::with_cycles(base, vec![HASH_CYCLE_LEN])
        })
        .collect()
}

/// Evaluate the absorb constraints of one chain, gated by the absorb mask
pub fn evaluate_absorb_constraints<E: FieldElement<BaseField = Felt>>(
    current: &[E],
    next: &[E],
    chain: Chain,
    absorb: E,
    result: &mut [E],
) -> usize {
    let state = chain.state();
    let start = next[cols::START];
    let bit = next[cols::BIT];

    for i in 0..DIGEST_SIZE {
        let output = current[state + i];
        let node = match chain {
            Chain::Old => output - start * output,
            Chain::New => output + start * (next[cols::new_leaf(i)] - output),
        };
        let sibling = next[cols::sibling(i)];
        let left = node + bit * (sibling - node);
        let right = sibling + bit * (node - sibling);

        result[i] = absorb * (next[state + i] - left);
        result[DIGEST_SIZE + i] = absorb * (next[state + DIGEST_SIZE + i] - right);
    }

    // Capacity holds the input length of a two-digest node
    let rate = E::from(felt_from_u64(RATE as u64));
    result[RATE] = absorb * (next[state + RATE] - rate);
    for i in RATE + 1..STATE_WIDTH {
        result[i] = absorb * next[state + i];
    }

    NUM_ABSORB_CONSTRAINTS
}
