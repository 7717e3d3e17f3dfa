//! Per-asset fee accumulation

use rollup_stark_air::HASH_CYCLE_LEN;
use rollup_stark_inner::NUM_ASSETS;
use rollup_stark_primitives::Felt;
use winter_air::TransitionConstraintDegree;
use winter_math::FieldElement;

use crate::air::trace_layout::cols;

pub const NUM_FEE_CONSTRAINTS: usize = NUM_ASSETS;

pub fn fee_constraint_degrees() -> Vec<TransitionConstraintDegree> {
    (0..NUM_FEE_CONSTRAINTS)
        .map(|_| TransitionConstraintDegree::with_cycles(1, vec![HASH_CYCLE_LEN]))
        .collect()
}

/// Fees grow by the scheduled increment when entering a cycle
pub fn evaluate_fee_constraints<E: FieldElement<BaseField = Felt>>(
    current: &[E],
    next: &[E],
    absorb: E,
    result: &mut [E],
) -> usize {
    for asset in 0..NUM_ASSETS {
        result[asset] =
            next[cols::fee(asset)] - current[cols::fee(asset)] - absorb * next[cols::fee_inc(asset)];
    }
    NUM_FEE_CONSTRAINTS
}
