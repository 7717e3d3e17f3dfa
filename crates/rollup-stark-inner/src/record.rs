//! Decoded inner proof public inputs

use rollup_stark_primitives::digest::hex_digest;
use rollup_stark_primitives::{
    digest_is_zero, felt_from_u64, felt_to_u64, Digest, Felt, DIGEST_SIZE, DIGEST_ZERO, FELT_ZERO,
};
use serde::{Deserialize, Serialize};

use crate::error::{InnerProofError, InnerResult};
use crate::kind::ProofKind;
use crate::layout::{inner_pi, NUM_ASSETS, NUM_INNER_PUBLIC_INPUTS};

/// Public inputs of one inner transaction proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerProofRecord {
    pub kind: ProofKind,
    pub public_input: u64,
    pub public_output: u64,
    pub asset_id: u32,
    #[serde(with = "hex_digest")]
    pub new_note1: Digest,
    #[serde(with = "hex_digest")]
    pub new_note2: Digest,
    #[serde(with = "hex_digest")]
    pub nullifier1: Digest,
    #[serde(with = "hex_digest")]
    pub nullifier2: Digest,
    #[serde(with = "hex_digest")]
    pub input_owner: Digest,
    #[serde(with = "hex_digest")]
    pub output_owner: Digest,
    /// Net fee, computed by the inner circuit
    pub tx_fee: u64,
    /// Claim proofs only
    pub interaction_nonce: u64,
}

impl InnerProofRecord {
    /// Record of the null join-split transaction used for padding
    ///
    /// Every field is zero; the join-split tag is zero as well.
    pub fn padding() -> Self {
        Self {
            kind: ProofKind::JoinSplit,
            public_input: 0,
            public_output: 0,
            asset_id: 0,
            new_note1: DIGEST_ZERO,
            new_note2: DIGEST_ZERO,
            nullifier1: DIGEST_ZERO,
            nullifier2: DIGEST_ZERO,
            input_owner: DIGEST_ZERO,
            output_owner: DIGEST_ZERO,
            tx_fee: 0,
            interaction_nonce: 0,
        }
    }

    /// New note commitments in insertion order
    pub fn notes(&self) -> [Digest; 2] {
        [self.new_note1, self.new_note2]
    }

    /// Nullifiers in insertion order
    pub fn nullifiers(&self) -> [Digest; 2] {
        [self.nullifier1, self.nullifier2]
    }

    /// Whether the record changes no state and pays no fee
    pub fn is_zero_effect(&self) -> bool {
        self.notes().iter().all(digest_is_zero)
            && self.nullifiers().iter().all(digest_is_zero)
            && self.tx_fee == 0
            && self.public_input == 0
            && self.public_output == 0
    }

    /// Flatten into the fixed public-input layout
    pub fn to_elements(&self) -> Vec<Felt> {
        let mut elements = vec![FELT_ZERO; NUM_INNER_PUBLIC_INPUTS];
        elements[inner_pi::PROOF_KIND] = felt_from_u64(self.kind.tag());
        elements[inner_pi::PUBLIC_INPUT] = felt_from_u64(self.public_input);
        elements[inner_pi::PUBLIC_OUTPUT] = felt_from_u64(self.public_output);
        elements[inner_pi::ASSET_ID] = felt_from_u64(self.asset_id as u64);
        put_digest(&mut elements, inner_pi::NEW_NOTE1, &self.new_note1);
        put_digest(&mut elements, inner_pi::NEW_NOTE2, &self.new_note2);
        put_digest(&mut elements, inner_pi::NULLIFIER1, &self.nullifier1);
        put_digest(&mut elements, inner_pi::NULLIFIER2, &self.nullifier2);
        put_digest(&mut elements, inner_pi::INPUT_OWNER, &self.input_owner);
        put_digest(&mut elements, inner_pi::OUTPUT_OWNER, &self.output_owner);
        elements[inner_pi::TX_FEE] = felt_from_u64(self.tx_fee);
        elements[inner_pi::INTERACTION_NONCE] = felt_from_u64(self.interaction_nonce);
        elements
    }

    /// Parse the fixed public-input layout, validating its shape
    pub fn from_elements(elements: &[Felt]) -> InnerResult<Self> {
        if elements.len() != NUM_INNER_PUBLIC_INPUTS {
            return Err(InnerProofError::WrongElementCount {
                expected: NUM_INNER_PUBLIC_INPUTS,
                actual: elements.len(),
            });
        }

        let kind = ProofKind::from_tag(felt_to_u64(elements[inner_pi::PROOF_KIND]))?;

        let asset_id = felt_to_u64(elements[inner_pi::ASSET_ID]);
        if asset_id >= NUM_ASSETS as u64 {
            return Err(InnerProofError::AssetOutOfRange {
                asset_id,
                max: NUM_ASSETS - 1,
            });
        }

        let interaction_nonce = felt_to_u64(elements[inner_pi::INTERACTION_NONCE]);
        if interaction_nonce != 0 && !kind.has_interaction_nonce() {
            return Err(InnerProofError::UnexpectedInteractionNonce(kind));
        }

        Ok(Self {
            kind,
            public_input: felt_to_u64(elements[inner_pi::PUBLIC_INPUT]),
            public_output: felt_to_u64(elements[inner_pi::PUBLIC_OUTPUT]),
            asset_id: asset_id as u32,
            new_note1: get_digest(elements, inner_pi::NEW_NOTE1),
            new_note2: get_digest(elements, inner_pi::NEW_NOTE2),
            nullifier1: get_digest(elements, inner_pi::NULLIFIER1),
            nullifier2: get_digest(elements, inner_pi::NULLIFIER2),
            input_owner: get_digest(elements, inner_pi::INPUT_OWNER),
            output_owner: get_digest(elements, inner_pi::OUTPUT_OWNER),
            tx_fee: felt_to_u64(elements[inner_pi::TX_FEE]),
            interaction_nonce,
        })
    }
}

fn put_digest(elements: &mut [Felt], offset: usize, digest: &Digest) {
    elements[offset..offset + DIGEST_SIZE].copy_from_slice(digest);
}

fn get_digest(elements: &[Felt], offset: usize) -> Digest {
    let mut digest = DIGEST_ZERO;
    digest.copy_from_slice(&elements[offset..offset + DIGEST_SIZE]);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InnerProofRecord {
        let d = |x: u64| [felt_from_u64(x), felt_from_u64(x + 1), felt_from_u64(x + 2), felt_from_u64(x + 3)];
        InnerProofRecord {
            kind: ProofKind::Claim,
            public_input: 10,
            public_output: 3,
            asset_id: 2,
            new_note1: d(100),
            new_note2: d(200),
            nullifier1: d(300),
            nullifier2: DIGEST_ZERO,
            input_owner: d(400),
            output_owner: d(500),
            tx_fee: 7,
            interaction_nonce: 99,
        }
    }

    #[test]
    fn test_elements_positions() {
        let record = sample();
        let elements = record.to_elements();
        assert_eq!(elements.len(), NUM_INNER_PUBLIC_INPUTS);
        assert_eq!(felt_to_u64(elements[inner_pi::PROOF_KIND]), 2);
        assert_eq!(felt_to_u64(elements[inner_pi::TX_FEE]), 7);
        assert_eq!(felt_to_u64(elements[inner_pi::NULLIFIER1]), 300);
        assert_eq!(InnerProofRecord::from_elements(&elements).unwrap(), record);
    }

    #[test]
    fn test_padding_is_all_zero() {
        let padding = InnerProofRecord::padding();
        assert!(padding.is_zero_effect());
        assert!(padding.to_elements().iter().all(|e| *e == FELT_ZERO));
    }

    #[test]
    fn test_rejects_wrong_count() {
        let elements = vec![FELT_ZERO; NUM_INNER_PUBLIC_INPUTS - 1];
        assert_eq!(
            InnerProofRecord::from_elements(&elements),
            Err(InnerProofError::WrongElementCount {
                expected: NUM_INNER_PUBLIC_INPUTS,
                actual: NUM_INNER_PUBLIC_INPUTS - 1
            })
        );
    }

    #[test]
    fn test_rejects_asset_out_of_range() {
        let mut elements = sample().to_elements();
        elements[inner_pi::ASSET_ID] = felt_from_u64(NUM_ASSETS as u64);
        assert!(matches!(
            InnerProofRecord::from_elements(&elements),
            Err(InnerProofError::AssetOutOfRange { .. })
        ));
    }

    #[test]
    fn test_nonce_only_for_claims() {
        let mut record = sample();
        record.kind = ProofKind::JoinSplit;
        assert_eq!(
            InnerProofRecord::from_elements(&record.to_elements()),
            Err(InnerProofError::UnexpectedInteractionNonce(ProofKind::JoinSplit))
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use rollup_stark_primitives::GOLDILOCKS_PRIME;

        fn digest() -> impl Strategy<Value = Digest> {
            prop::array::uniform4(0..GOLDILOCKS_PRIME).prop_map(|limbs| limbs.map(felt_from_u64))
        }

        fn record() -> impl Strategy<Value = InnerProofRecord> {
            let kind = prop_oneof![
                Just(ProofKind::JoinSplit),
                Just(ProofKind::Account),
                Just(ProofKind::Claim)
            ];
            let amounts = prop::array::uniform4(0..GOLDILOCKS_PRIME);
            let digests = prop::collection::vec(digest(), 6);
            (kind, amounts, 0..NUM_ASSETS as u32, digests).prop_map(|(kind, amounts, asset_id, d)| {
                InnerProofRecord {
                    kind,
                    public_input: amounts[0],
                    public_output: amounts[1],
                    asset_id,
                    new_note1: d[0],
                    new_note2: d[1],
                    nullifier1: d[2],
                    nullifier2: d[3],
                    input_owner: d[4],
                    output_owner: d[5],
                    tx_fee: amounts[2],
                    interaction_nonce: if kind.has_interaction_nonce() { amounts[3] } else { 0 },
                }
            })
        }

        proptest! {
            #[test]
            fn prop_elements_round_trip(record in record()) {
                let elements = record.to_elements();
                prop_assert_eq!(elements.len(), NUM_INNER_PUBLIC_INPUTS);
                prop_assert_eq!(InnerProofRecord::from_elements(&elements).unwrap(), record);
            }

            #[test]
            fn prop_accepted_elements_re_encode(
                values in prop::collection::vec(0..GOLDILOCKS_PRIME, NUM_INNER_PUBLIC_INPUTS),
                tag in 0u64..4,
                asset_id in 0u64..6,
            ) {
                let mut elements: Vec<Felt> = values.into_iter().map(felt_from_u64).collect();
                elements[inner_pi::PROOF_KIND] = felt_from_u64(tag);
                elements[inner_pi::ASSET_ID] = felt_from_u64(asset_id);

                if let Ok(record) = InnerProofRecord::from_elements(&elements) {
                    prop_assert!(tag < 3 && asset_id < NUM_ASSETS as u64);
                    prop_assert_eq!(record.to_elements(), elements);
                }
            }
        }
    }
}
