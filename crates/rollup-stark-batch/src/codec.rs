//! Rollup public-input codec
//!
//! The flat vector a rollup proof commits to:
//!
//! ```text
//! batch_id | width | data_start_index
//! old/new data root | old/new nullifier root | old/new roots root   (4 elements each)
//! total_fees[NUM_ASSETS]
//! width x inner record (NUM_INNER_PUBLIC_INPUTS each, slot order)
//! ```
//!
//! Proof bytes carry the same vector as a prefix, then the raw inner proof of
//! every slot, then the STARK proof:
//!
//! ```text
//! count (u32 BE) | count x element (u64 LE)
//! slots (u32 BE) | slots x (len (u32 BE) | raw inner proof)
//! STARK proof
//! ```

use rollup_stark_inner::decoder::{encode_public_inputs, encoded_public_inputs_len};
use rollup_stark_inner::{InnerProofRecord, NUM_ASSETS, NUM_INNER_PUBLIC_INPUTS};
use rollup_stark_primitives::digest::hex_digest;
use rollup_stark_primitives::{felt_from_u64, felt_to_u64, try_felt_from_u64, Digest, Felt, DIGEST_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::state::StateRoots;

/// Positions in the rollup public-input vector
pub mod rollup_pi {
    use super::{DIGEST_SIZE, NUM_ASSETS};

    pub const BATCH_ID: usize = 0;
    pub const WIDTH: usize = 1;
    pub const DATA_START_INDEX: usize = 2;
    pub const OLD_DATA_ROOT: usize = 3;
    pub const NEW_DATA_ROOT: usize = OLD_DATA_ROOT + DIGEST_SIZE;
    pub const OLD_NULLIFIER_ROOT: usize = NEW_DATA_ROOT + DIGEST_SIZE;
    pub const NEW_NULLIFIER_ROOT: usize = OLD_NULLIFIER_ROOT + DIGEST_SIZE;
    pub const OLD_ROOTS_ROOT: usize = NEW_NULLIFIER_ROOT + DIGEST_SIZE;
    pub const NEW_ROOTS_ROOT: usize = OLD_ROOTS_ROOT + DIGEST_SIZE;
    pub const TOTAL_FEES: usize = NEW_ROOTS_ROOT + DIGEST_SIZE;
    pub const SLOTS: usize = TOTAL_FEES + NUM_ASSETS;
}

/// Number of public-input elements for a width
pub fn public_input_len(width: usize) -> usize {
    rollup_pi::SLOTS + width * NUM_INNER_PUBLIC_INPUTS
}

/// Decoded public inputs of a rollup proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupResult {
    pub batch_id: u64,
    pub width: usize,
    pub data_start_index: u64,
    #[serde(with = "hex_digest")]
    pub old_data_root: Digest,
    #[serde(with = "hex_digest")]
    pub new_data_root: Digest,
    #[serde(with = "hex_digest")]
    pub old_nullifier_root: Digest,
    #[serde(with = "hex_digest")]
    pub new_nullifier_root: Digest,
    #[serde(with = "hex_digest")]
    pub old_roots_root: Digest,
    #[serde(with = "hex_digest")]
    pub new_roots_root: Digest,
    pub total_fees: [u64; NUM_ASSETS],
    /// One record per slot, padding included
    pub inner_proofs: Vec<InnerProofRecord>,
}

impl RollupResult {
    pub fn old_roots(&self) -> StateRoots {
        StateRoots {
            data: self.old_data_root,
            nullifier: self.old_nullifier_root,
            roots: self.old_roots_root,
        }
    }

    pub fn new_roots(&self) -> StateRoots {
        StateRoots {
            data: self.new_data_root,
            nullifier: self.new_nullifier_root,
            roots: self.new_roots_root,
        }
    }

    /// Roots-tree index written by this batch
    pub fn roots_index(&self) -> u64 {
        self.batch_id + 1
    }

    /// Number of slots holding something other than the null transaction
    pub fn num_effective(&self) -> usize {
        self.inner_proofs.iter().filter(|r| !r.is_zero_effect()).count()
    }

    pub fn encode(&self) -> Vec<Felt> {
        let mut elements = Vec::with_capacity(public_input_len(self.width));
        elements.push(felt_from_u64(self.batch_id));
        elements.push(felt_from_u64(self.width as u64));
        elements.push(felt_from_u64(self.data_start_index));
        for root in [
            &self.old_data_root,
            &self.new_data_root,
            &self.old_nullifier_root,
            &self.new_nullifier_root,
            &self.old_roots_root,
            &self.new_roots_root,
        ] {
            elements.extend_from_slice(root);
        }
        elements.extend(self.total_fees.iter().map(|&fee| felt_from_u64(fee)));
        for record in &self.inner_proofs {
            elements.extend(record.to_elements());
        }
        elements
    }

    pub fn decode(elements: &[Felt]) -> Result<Self, CodecError> {
        if elements.len() < rollup_pi::SLOTS {
            return Err(CodecError::TooShort(elements.len()));
        }

        let raw_width = felt_to_u64(elements[rollup_pi::WIDTH]);
        if raw_width == 0 || !raw_width.is_power_of_two() || raw_width > u32::MAX as u64 {
            return Err(CodecError::InvalidWidth(raw_width));
        }
        let width = raw_width as usize;

        let expected = public_input_len(width);
        if elements.len() != expected {
            return Err(CodecError::LengthMismatch {
                width,
                expected,
                actual: elements.len(),
            });
        }

        let digest_at = |offset: usize| -> Digest {
            [
                elements[offset],
                elements[offset + 1],
                elements[offset + 2],
                elements[offset + 3],
            ]
        };

        let mut total_fees = [0u64; NUM_ASSETS];
        for (asset, fee) in total_fees.iter_mut().enumerate() {
            *fee = felt_to_u64(elements[rollup_pi::TOTAL_FEES + asset]);
        }

        let inner_proofs = elements[rollup_pi::SLOTS..]
            .chunks(NUM_INNER_PUBLIC_INPUTS)
            .enumerate()
            .map(|(slot, chunk)| {
                InnerProofRecord::from_elements(chunk)
                    .map_err(|source| CodecError::InvalidSlot { slot, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            batch_id: felt_to_u64(elements[rollup_pi::BATCH_ID]),
            width,
            data_start_index: felt_to_u64(elements[rollup_pi::DATA_START_INDEX]),
            old_data_root: digest_at(rollup_pi::OLD_DATA_ROOT),
            new_data_root: digest_at(rollup_pi::NEW_DATA_ROOT),
            old_nullifier_root: digest_at(rollup_pi::OLD_NULLIFIER_ROOT),
            new_nullifier_root: digest_at(rollup_pi::NEW_NULLIFIER_ROOT),
            old_roots_root: digest_at(rollup_pi::OLD_ROOTS_ROOT),
            new_roots_root: digest_at(rollup_pi::NEW_ROOTS_ROOT),
            total_fees,
            inner_proofs,
        })
    }
}

/// Proof bytes split into their sections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofParts<'a> {
    pub public_inputs: Vec<Felt>,
    /// Raw inner proof of every slot, in slot order
    pub inner_proofs: Vec<&'a [u8]>,
    pub stark_proof: &'a [u8],
}

/// Frame the public inputs, the slots' inner proofs and the STARK proof
pub fn encode_proof_bytes<P: AsRef<[u8]>>(
    result: &RollupResult,
    inner_proofs: &[P],
    stark_proof: &[u8],
) -> Vec<u8> {
    let mut bytes = encode_public_inputs(&result.encode());
    bytes.extend_from_slice(&(inner_proofs.len() as u32).to_be_bytes());
    for proof in inner_proofs {
        let proof = proof.as_ref();
        bytes.extend_from_slice(&(proof.len() as u32).to_be_bytes());
        bytes.extend_from_slice(proof);
    }
    bytes.extend_from_slice(stark_proof);
    bytes
}

/// Split proof bytes into their sections
pub fn split_proof_bytes(bytes: &[u8]) -> Result<ProofParts<'_>, CodecError> {
    let count = read_u32(bytes, 0, "the element count")?;
    let prefix_len = encoded_public_inputs_len(count);
    if bytes.len() < prefix_len {
        return Err(CodecError::MalformedBytes(format!(
            "{count} public inputs need {prefix_len} bytes, got {}",
            bytes.len()
        )));
    }

    let public_inputs = bytes[4..prefix_len]
        .chunks_exact(8)
        .enumerate()
        .map(|(index, chunk)| {
            let mut limb = [0u8; 8];
            limb.copy_from_slice(chunk);
            let value = u64::from_le_bytes(limb);
            try_felt_from_u64(value).ok_or(CodecError::ValueOutOfRange { index, value })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let num_slots = read_u32(bytes, prefix_len, "the inner proof count")?;
    let mut offset = prefix_len + 4;
    let mut inner_proofs = Vec::with_capacity(num_slots.min(bytes.len() / 4));
    for slot in 0..num_slots {
        let len = read_u32(bytes, offset, "an inner proof length")?;
        let end = offset + 4 + len;
        if bytes.len() < end {
            return Err(CodecError::MalformedBytes(format!(
                "inner proof of slot {slot} needs {len} bytes, got {}",
                bytes.len() - offset - 4
            )));
        }
        inner_proofs.push(&bytes[offset + 4..end]);
        offset = end;
    }

    Ok(ProofParts {
        public_inputs,
        inner_proofs,
        stark_proof: &bytes[offset..],
    })
}

fn read_u32(bytes: &[u8], offset: usize, what: &str) -> Result<usize, CodecError> {
    match bytes.get(offset..offset + 4) {
        Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as usize),
        None => Err(CodecError::MalformedBytes(format!(
            "need 4 bytes for {what} at offset {offset}, got {}",
            bytes.len().saturating_sub(offset)
        ))),
    }
}

/// Decode only the public inputs of proof bytes
pub fn decode_proof_bytes(bytes: &[u8]) -> Result<RollupResult, CodecError> {
    let parts = split_proof_bytes(bytes)?;
    RollupResult::decode(&parts.public_inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollup_stark_inner::ProofKind;
    use rollup_stark_primitives::{rescue_hash, GOLDILOCKS_PRIME};

    fn digest(n: u64) -> Digest {
        rescue_hash(&[felt_from_u64(n)])
    }

    fn sample(width: usize) -> RollupResult {
        let mut transfer = InnerProofRecord::padding();
        transfer.new_note1 = digest(1);
        transfer.nullifier1 = digest(2);
        transfer.asset_id = 1;
        transfer.tx_fee = 7;

        let mut inner_proofs = vec![InnerProofRecord::padding(); width];
        inner_proofs[0] = transfer;

        RollupResult {
            batch_id: 3,
            width,
            data_start_index: 8,
            old_data_root: digest(10),
            new_data_root: digest(11),
            old_nullifier_root: digest(12),
            new_nullifier_root: digest(13),
            old_roots_root: digest(14),
            new_roots_root: digest(15),
            total_fees: [0, 7, 0, 0],
            inner_proofs,
        }
    }

    #[test]
    fn test_layout_positions() {
        assert_eq!(rollup_pi::OLD_DATA_ROOT, 3);
        assert_eq!(rollup_pi::TOTAL_FEES, 27);
        assert_eq!(rollup_pi::SLOTS, 31);
        assert_eq!(public_input_len(4), 31 + 120);
    }

    #[test]
    fn test_encode_places_fields() {
        let result = sample(2);
        let elements = result.encode();
        assert_eq!(elements.len(), public_input_len(2));
        assert_eq!(felt_to_u64(elements[rollup_pi::BATCH_ID]), 3);
        assert_eq!(felt_to_u64(elements[rollup_pi::WIDTH]), 2);
        assert_eq!(&elements[rollup_pi::NEW_ROOTS_ROOT..rollup_pi::TOTAL_FEES], &digest(15));
        assert_eq!(felt_to_u64(elements[rollup_pi::TOTAL_FEES + 1]), 7);
        assert_eq!(RollupResult::decode(&elements).unwrap(), result);
    }

    #[test]
    fn test_decode_rejects_bad_width() {
        let mut elements = sample(2).encode();
        elements[rollup_pi::WIDTH] = felt_from_u64(3);
        assert_eq!(RollupResult::decode(&elements), Err(CodecError::InvalidWidth(3)));

        elements[rollup_pi::WIDTH] = felt_from_u64(0);
        assert_eq!(RollupResult::decode(&elements), Err(CodecError::InvalidWidth(0)));
    }

    #[test]
    fn test_decode_rejects_length_mismatch() {
        let mut elements = sample(2).encode();
        elements.pop();
        assert!(matches!(
            RollupResult::decode(&elements),
            Err(CodecError::LengthMismatch { width: 2, .. })
        ));
        assert_eq!(
            RollupResult::decode(&elements[..10]),
            Err(CodecError::TooShort(10))
        );
    }

    #[test]
    fn test_decode_rejects_bad_slot() {
        let mut elements = sample(2).encode();
        elements[rollup_pi::SLOTS + NUM_INNER_PUBLIC_INPUTS] = felt_from_u64(9);
        assert!(matches!(
            RollupResult::decode(&elements),
            Err(CodecError::InvalidSlot { slot: 1, .. })
        ));
    }

    #[test]
    fn test_proof_bytes_sections() {
        let result = sample(2);
        let inner = [b"first slot".to_vec(), Vec::new()];
        let bytes = encode_proof_bytes(&result, &inner, b"stark");
        let parts = split_proof_bytes(&bytes).unwrap();
        assert_eq!(parts.stark_proof, b"stark");
        assert_eq!(parts.inner_proofs, vec![&b"first slot"[..], &[][..]]);
        assert_eq!(RollupResult::decode(&parts.public_inputs).unwrap(), result);
        assert_eq!(decode_proof_bytes(&bytes).unwrap().inner_proofs[0].kind, ProofKind::JoinSplit);
    }

    #[test]
    fn test_split_rejects_truncated_and_non_canonical() {
        let bytes = encode_proof_bytes(&sample(1), &[b"inner".to_vec()], &[]);
        assert!(matches!(
            split_proof_bytes(&bytes[..bytes.len() - 1]),
            Err(CodecError::MalformedBytes(_))
        ));
        assert!(split_proof_bytes(&[0, 0]).is_err());

        // public inputs intact, inner proof section missing
        let prefix_len = encoded_public_inputs_len(public_input_len(1));
        assert!(matches!(
            split_proof_bytes(&bytes[..prefix_len + 2]),
            Err(CodecError::MalformedBytes(_))
        ));

        let mut bad = bytes.clone();
        bad[4..12].copy_from_slice(&GOLDILOCKS_PRIME.to_le_bytes());
        assert_eq!(
            split_proof_bytes(&bad),
            Err(CodecError::ValueOutOfRange { index: 0, value: GOLDILOCKS_PRIME })
        );
    }

    #[test]
    fn test_split_rejects_oversized_inner_proof_length() {
        let mut bytes = encode_proof_bytes(&sample(1), &[b"inner".to_vec()], b"stark");
        let length_at = encoded_public_inputs_len(public_input_len(1)) + 4;
        bytes[length_at..length_at + 4].copy_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(split_proof_bytes(&bytes), Err(CodecError::MalformedBytes(_))));
    }

    #[test]
    fn test_num_effective() {
        assert_eq!(sample(4).num_effective(), 1);
        assert_eq!(sample(4).roots_index(), 4);
    }
}
