//! Rollup AIR
//!
//! Proves that applying the scheduled leaf writes to the three state trees
//! moves them from the old roots to the new roots in the public inputs, and
//! that the fee totals are the sums of the per-slot fees. Each write is a
//! dual-chain Merkle update (see `trace_layout`); the schedule is recomputed
//! from the public inputs by the verifier, so the prover chooses nothing but
//! the sibling digests.

use rollup_stark_air::rescue_air::{self, ABSORB_MASK};
use rollup_stark_inner::NUM_ASSETS;
use rollup_stark_primitives::rescue::STATE_WIDTH;
use rollup_stark_primitives::{Felt, DIGEST_SIZE, FELT_ZERO};
use winter_air::{
    Air, AirContext, Assertion, EvaluationFrame, ProofOptions, TraceInfo,
    TransitionConstraintDegree,
};
use winter_math::FieldElement;

use crate::air::constraints::{
    absorb_constraint_degrees, evaluate_absorb_constraints, evaluate_fee_constraints,
    evaluate_root_constraints, fee_constraint_degrees, root_constraint_degrees, Chain,
    NUM_ABSORB_CONSTRAINTS, NUM_FEE_CONSTRAINTS, NUM_ROOT_CONSTRAINTS,
};
use crate::air::schedule::UpdateSchedule;
use crate::air::trace_layout::cols;
use crate::public_inputs::RollupPublicInputs;
use crate::state::TreeId;

/// Smallest blowup factor the degree-7 round constraints allow
pub const MIN_BLOWUP_FACTOR: usize = 8;

/// Number of transition constraints
pub const NUM_ROLLUP_CONSTRAINTS: usize =
    2 * STATE_WIDTH + 2 * NUM_ABSORB_CONSTRAINTS + NUM_ROOT_CONSTRAINTS + NUM_FEE_CONSTRAINTS;

/// The rollup AIR
pub struct RollupAir {
    context: AirContext<Felt>,
    pub_inputs: RollupPublicInputs,
    assertions: Vec<Assertion<Felt>>,
}

impl RollupAir {
    pub fn new(trace_info: TraceInfo, pub_inputs: RollupPublicInputs, options: ProofOptions) -> Self {
        let mut degrees: Vec<TransitionConstraintDegree> = Vec::with_capacity(NUM_ROLLUP_CONSTRAINTS);

        // Rescue rounds on both chains (24)
        degrees.extend(rescue_air::round_constraint_degrees());
        degrees.extend(rescue_air::round_constraint_degrees());

        // Absorb rows on both chains (24)
        degrees.extend(absorb_constraint_degrees());
        degrees.extend(absorb_constraint_degrees());

        // Running roots (24) and fees (4)
        degrees.extend(root_constraint_degrees());
        degrees.extend(fee_constraint_degrees());

        let schedule = UpdateSchedule::new(&pub_inputs.result, &pub_inputs.depths);
        let assertions = build_assertions(&pub_inputs, &schedule, trace_info.length());

        let context = AirContext::new(trace_info, degrees, assertions.len(), options);

        Self {
            context,
            pub_inputs,
            assertions,
        }
    }

    pub fn public_inputs(&self) -> &RollupPublicInputs {
        &self.pub_inputs
    }
}

/// Boundary and schedule assertions for a trace of `trace_length` rows
fn build_assertions(
    pub_inputs: &RollupPublicInputs,
    schedule: &UpdateSchedule,
    trace_length: usize,
) -> Vec<Assertion<Felt>> {
    let result = &pub_inputs.result;
    let last_row = trace_length - 1;
    let mut assertions = Vec::new();

    // =========================================================================
    // First and last row: roots and fees
    // =========================================================================

    let old_roots = result.old_roots();
    let new_roots = result.new_roots();
    for tree in TreeId::ALL {
        let old = old_roots.get(tree);
        for (i, value) in old.iter().enumerate() {
            assertions.push(Assertion::single(cols::root(tree) + i, 0, *value));
        }
        let new = new_roots.get(tree);
        for (i, value) in new.iter().enumerate() {
            assertions.push(Assertion::single(cols::root(tree) + i, last_row, *value));
        }
    }

    for asset in 0..NUM_ASSETS {
        assertions.push(Assertion::single(cols::fee(asset), 0, FELT_ZERO));
        assertions.push(Assertion::single(
            cols::fee(asset),
            last_row,
            Felt::new(result.total_fees[asset]),
        ));
    }

    // =========================================================================
    // Schedule columns on the first row of every cycle
    // =========================================================================

    let num_cycles = trace_length / rollup_stark_air::HASH_CYCLE_LEN;
    let columns = schedule.cycle_columns();
    for (column, values) in columns.by_column() {
        let mut values = values.to_vec();
        values.resize(num_cycles, FELT_ZERO);
        assertions.push(Assertion::sequence(
            column,
            0,
            rollup_stark_air::HASH_CYCLE_LEN,
            values,
        ));
    }

    assertions
}

impl Air for RollupAir {
    type BaseField = Felt;
    type PublicInputs = RollupPublicInputs;
    type GkrProof = ();
    type GkrVerifier = ();

    fn new(trace_info: TraceInfo, pub_inputs: Self::PublicInputs, options: ProofOptions) -> Self {
        RollupAir::new(trace_info, pub_inputs, options)
    }

    fn context(&self) -> &AirContext<Self::BaseField> {
        &self.context
    }

    fn get_assertions(&self) -> Vec<Assertion<Self::BaseField>> {
        self.assertions.clone()
    }

    fn evaluate_transition<E: FieldElement<BaseField = Self::BaseField>>(
        &self,
        frame: &EvaluationFrame<E>,
        periodic_values: &[E],
        result: &mut [E],
    ) {
        let current = frame.current();
        let next = frame.next();
        let absorb = periodic_values[ABSORB_MASK];

        let mut idx = 0;

        // =========================================================================
        // Rescue rounds (24)
        // =========================================================================

        for state in [cols::OLD_STATE, cols::NEW_STATE] {
            rescue_air::evaluate_rounds(
                &current[state..state + STATE_WIDTH],
                &next[state..state + STATE_WIDTH],
                periodic_values,
                &mut result[idx..idx + STATE_WIDTH],
            );
            idx += STATE_WIDTH;
        }

        // =========================================================================
        // Absorb rows (24)
        // =========================================================================

        for chain in [Chain::Old, Chain::New] {
            idx += evaluate_absorb_constraints(current, next, chain, absorb, &mut result[idx..]);
        }

        // =========================================================================
        // Running roots (24) and fees (4)
        // =========================================================================

        idx += evaluate_root_constraints(current, next, absorb, &mut result[idx..]);
        idx += evaluate_fee_constraints(current, next, absorb, &mut result[idx..]);

        debug_assert_eq!(idx, NUM_ROLLUP_CONSTRAINTS);
    }

    fn get_periodic_column_values(&self) -> Vec<Vec<Self::BaseField>> {
        rescue_air::periodic_columns()
    }
}

/// Assertions expected on a trace of the schedule's own length
pub fn num_assertions() -> usize {
    // 3 trees x (old + new) roots, fees at both ends, one sequence per schedule column
    TreeId::ALL.len() * 2 * DIGEST_SIZE + 2 * NUM_ASSETS + (5 + DIGEST_SIZE + NUM_ASSETS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RollupResult;
    use crate::config::TreeDepths;
    use crate::air::trace_layout::TRACE_WIDTH;
    use rollup_stark_inner::InnerProofRecord;
    use rollup_stark_primitives::DIGEST_ZERO;

    fn pub_inputs() -> RollupPublicInputs {
        let result = RollupResult {
            batch_id: 0,
            width: 1,
            data_start_index: 0,
            old_data_root: DIGEST_ZERO,
            new_data_root: DIGEST_ZERO,
            old_nullifier_root: DIGEST_ZERO,
            new_nullifier_root: DIGEST_ZERO,
            old_roots_root: DIGEST_ZERO,
            new_roots_root: DIGEST_ZERO,
            total_fees: [0; NUM_ASSETS],
            inner_proofs: vec![InnerProofRecord::padding()],
        };
        RollupPublicInputs::new(result, TreeDepths { data: 2, nullifier: 2, roots: 2 })
    }

    #[test]
    fn test_constraint_count() {
        assert_eq!(NUM_ROLLUP_CONSTRAINTS, 76);
    }

    #[test]
    fn test_air_shape() {
        let inputs = pub_inputs();
        let schedule = UpdateSchedule::new(&inputs.result, &inputs.depths);
        let trace_info = TraceInfo::new(TRACE_WIDTH, schedule.trace_length());
        let options = rollup_stark_air::ProofOptions::fast().try_to_winterfell().unwrap();
        let air = RollupAir::new(trace_info, inputs, options);

        assert_eq!(air.get_assertions().len(), num_assertions());
        assert_eq!(air.get_periodic_column_values().len(), rescue_air::NUM_PERIODIC_COLUMNS);
        assert_eq!(air.context().num_transition_constraints(), NUM_ROLLUP_CONSTRAINTS);
    }
}
