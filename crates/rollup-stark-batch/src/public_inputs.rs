//! Public inputs for the rollup AIR

use rollup_stark_primitives::{felt_from_u64, Felt};
use winter_math::ToElements;

use crate::codec::RollupResult;
use crate::config::TreeDepths;

/// Public inputs of a rollup proof
///
/// The committed vector is the codec encoding of the result followed by the
/// three tree depths, so a proof is bound to the tree shapes it was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupPublicInputs {
    pub result: RollupResult,
    pub depths: TreeDepths,
}

impl RollupPublicInputs {
    pub fn new(result: RollupResult, depths: TreeDepths) -> Self {
        Self { result, depths }
    }
}

impl ToElements<Felt> for RollupPublicInputs {
    fn to_elements(&self) -> Vec<Felt> {
        let mut elements = self.result.encode();
        elements.push(felt_from_u64(self.depths.data as u64));
        elements.push(felt_from_u64(self.depths.nullifier as u64));
        elements.push(felt_from_u64(self.depths.roots as u64));
        elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::public_input_len;
    use rollup_stark_inner::InnerProofRecord;
    use rollup_stark_primitives::{felt_to_u64, DIGEST_ZERO};

    #[test]
    fn test_elements_end_with_depths() {
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
            total_fees: [0; 4],
            inner_proofs: vec![InnerProofRecord::padding()],
        };
        let inputs = RollupPublicInputs::new(result, TreeDepths::testing());
        let elements = inputs.to_elements();
        assert_eq!(elements.len(), public_input_len(1) + 3);
        let tail: Vec<u64> = elements[elements.len() - 3..].iter().map(|e| felt_to_u64(*e)).collect();
        assert_eq!(tail, vec![8, 24, 8]);
    }
}
