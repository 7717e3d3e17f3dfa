//! Inner proof decoder
//!
//! Raw inner proof bytes are `count (u32 BE) || count x u64 LE || proof body`.
//! Decoding checks shape only: element count, canonical elements, the kind tag
//! and the per-kind field rules. The proof body is opaque here and is checked
//! by the inner proof system when the rollup is proven.

use rollup_stark_primitives::{felt_to_u64, try_felt_from_u64, Felt};
use serde::{Deserialize, Serialize};

use crate::error::{InnerProofError, InnerResult};
use crate::kind::ProofKind;
use crate::layout::NUM_INNER_PUBLIC_INPUTS;
use crate::record::InnerProofRecord;

const COUNT_PREFIX_LEN: usize = 4;
const ELEMENT_LEN: usize = 8;

/// A raw inner proof as submitted to the assembler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInnerProof {
    /// Kind declared by the submitter
    pub kind: ProofKind,
    /// Encoded public inputs followed by the proof body
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl RawInnerProof {
    pub fn new(kind: ProofKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }
}

/// A structurally valid inner proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerProof {
    pub record: InnerProofRecord,
    /// Full raw bytes, kept for verification by the inner proof system
    pub data: Vec<u8>,
}

impl InnerProof {
    pub fn kind(&self) -> ProofKind {
        self.record.kind
    }

    /// The opaque proof body following the public inputs
    pub fn body(&self) -> &[u8] {
        &self.data[encoded_public_inputs_len(NUM_INNER_PUBLIC_INPUTS)..]
    }
}

/// Byte length of an encoded public-input prefix
pub const fn encoded_public_inputs_len(count: usize) -> usize {
    COUNT_PREFIX_LEN + count * ELEMENT_LEN
}

/// Serialize public inputs in the prefix format
pub fn encode_public_inputs(elements: &[Felt]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_public_inputs_len(elements.len()));
    out.extend_from_slice(&(elements.len() as u32).to_be_bytes());
    for e in elements {
        out.extend_from_slice(&felt_to_u64(*e).to_le_bytes());
    }
    out
}

/// Assemble raw proof bytes from public inputs and a proof body
pub fn encode_inner_proof(elements: &[Felt], body: &[u8]) -> Vec<u8> {
    let mut out = encode_public_inputs(elements);
    out.extend_from_slice(body);
    out
}

/// Read the public-input prefix of raw proof bytes
///
/// Rejects any count other than `expected` before reading elements.
pub fn read_public_inputs(bytes: &[u8], expected: usize) -> InnerResult<Vec<Felt>> {
    if bytes.len() < COUNT_PREFIX_LEN {
        return Err(InnerProofError::Truncated {
            needed: COUNT_PREFIX_LEN,
            actual: bytes.len(),
        });
    }
    let mut prefix = [0u8; COUNT_PREFIX_LEN];
    prefix.copy_from_slice(&bytes[..COUNT_PREFIX_LEN]);
    let count = u32::from_be_bytes(prefix) as usize;
    if count != expected {
        return Err(InnerProofError::WrongElementCount {
            expected,
            actual: count,
        });
    }

    let needed = encoded_public_inputs_len(count);
    if bytes.len() < needed {
        return Err(InnerProofError::Truncated {
            needed,
            actual: bytes.len(),
        });
    }

    bytes[COUNT_PREFIX_LEN..needed]
        .chunks_exact(ELEMENT_LEN)
        .enumerate()
        .map(|(index, chunk)| {
            let mut le = [0u8; ELEMENT_LEN];
            le.copy_from_slice(chunk);
            try_felt_from_u64(u64::from_le_bytes(le))
                .ok_or(InnerProofError::NonCanonicalElement { index })
        })
        .collect()
}

/// Decode raw proof bytes of a declared kind into an [`InnerProof`]
pub fn decode_inner_proof(bytes: &[u8], declared: ProofKind) -> InnerResult<InnerProof> {
    let elements = read_public_inputs(bytes, NUM_INNER_PUBLIC_INPUTS)?;
    let record = InnerProofRecord::from_elements(&elements)?;
    if record.kind != declared {
        return Err(InnerProofError::KindMismatch {
            declared,
            found: record.kind,
        });
    }
    Ok(InnerProof {
        record,
        data: bytes.to_vec(),
    })
}

/// Decode a [`RawInnerProof`]
pub fn decode_raw(raw: &RawInnerProof) -> InnerResult<InnerProof> {
    decode_inner_proof(&raw.data, raw.kind)
}

/// Serde adapter for byte vectors as hex strings
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
