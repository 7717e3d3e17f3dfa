//! Hash-commitment mock of the inner proof system
//!
//! A proof body is a domain-separated SHA-256 tag over the verification key id
//! and the encoded public inputs. Anyone can compute it, so it carries no
//! soundness; it stands in for the real inner circuits in tests, benchmarks
//! and the sequencer simulation while using the real byte formats.
//!
//! The transaction builders own the fee balancing that a real inner circuit
//! enforces: `fee = public_input + inputs - public_output - outputs`.

use rollup_stark_primitives::field::felt_from_bytes_le;
use rollup_stark_primitives::{Digest, Hash256, DIGEST_ZERO, GOLDILOCKS_PRIME};

use crate::decoder::{
    encode_inner_proof, encode_public_inputs, encoded_public_inputs_len, read_public_inputs,
    RawInnerProof,
};
use crate::error::{InnerProofError, InnerResult};
use crate::keys::{InnerProofSystem, VerificationKey, VerificationKeySet};
use crate::kind::ProofKind;
use crate::note::{alias_nullifier, claim_nullifier, AccountNote, ValueNote};
use crate::record::InnerProofRecord;

const MOCK_PROOF_DOMAIN: &[u8] = b"ROLLUP_STARK_MOCK_INNER_PROOF_V1";
const MOCK_KEY_DOMAIN: &[u8] = b"ROLLUP_STARK_MOCK_KEY_V1";
const TAG_LEN: usize = 32;

/// Mock prover and verifier for inner proofs
#[derive(Debug, Clone)]
pub struct HashProofSystem {
    keys: VerificationKeySet,
}

impl Default for HashProofSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl HashProofSystem {
    pub fn new() -> Self {
        Self {
            keys: VerificationKeySet {
                join_split: VerificationKey::new(ProofKind::JoinSplit, b"mock join-split circuit"),
                account: VerificationKey::new(ProofKind::Account, b"mock account circuit"),
                claim: VerificationKey::new(ProofKind::Claim, b"mock claim circuit"),
            },
        }
    }

    pub fn verification_keys(&self) -> &VerificationKeySet {
        &self.keys
    }

    /// Produce raw proof bytes for a record
    pub fn prove(&self, record: &InnerProofRecord) -> RawInnerProof {
        let elements = record.to_elements();
        let vk = self.keys.for_kind(record.kind);
        let tag = proof_tag(vk, &encode_public_inputs(&elements));
        RawInnerProof::new(record.kind, encode_inner_proof(&elements, tag.as_bytes()))
    }

    /// Proof of the null join-split transaction
    pub fn padding_proof(&self) -> RawInnerProof {
        self.prove(&InnerProofRecord::padding())
    }
}

impl InnerProofSystem for HashProofSystem {
    fn verify(&self, proof: &[u8], vk: &VerificationKey) -> bool {
        let Ok(elements) = read_public_inputs(proof, vk.num_public_inputs) else {
            return false;
        };
        let Ok(record) = InnerProofRecord::from_elements(&elements) else {
            return false;
        };
        if record.kind != vk.kind {
            return false;
        }

        let prefix_len = encoded_public_inputs_len(vk.num_public_inputs);
        if proof.len() != prefix_len + TAG_LEN {
            return false;
        }
        let (public_inputs, body) = proof.split_at(prefix_len);
        &proof_tag(vk, public_inputs).as_bytes()[..] == body
    }
}

fn proof_tag(vk: &VerificationKey, encoded_public_inputs: &[u8]) -> Hash256 {
    Hash256::sha256_parts(MOCK_PROOF_DOMAIN, &[&vk.id.as_bytes()[..], encoded_public_inputs])
}

/// Deterministic key material for fixtures: a digest derived from a label
pub fn derive_key(label: &str, index: u64) -> Digest {
    let hash = Hash256::sha256_parts(MOCK_KEY_DOMAIN, &[label.as_bytes(), &index.to_le_bytes()[..]]);
    let bytes = hash.as_bytes();
    [
        felt_from_bytes_le(&bytes[0..8]),
        felt_from_bytes_le(&bytes[8..16]),
        felt_from_bytes_le(&bytes[16..24]),
        felt_from_bytes_le(&bytes[24..32]),
    ]
}

fn check_amount(value: u128) -> InnerResult<u64> {
    if value >= GOLDILOCKS_PRIME as u128 {
        return Err(InnerProofError::ValueOutOfRange(value));
    }
    Ok(value as u64)
}

/// A value transfer
#[derive(Debug, Clone)]
pub struct JoinSplitTx {
    pub asset_id: u32,
    pub public_input: u64,
    pub public_output: u64,
    pub input_notes: Vec<ValueNote>,
    pub output_notes: Vec<ValueNote>,
    pub spending_key: Digest,
    pub input_owner: Digest,
    pub output_owner: Digest,
}

impl JoinSplitTx {
    /// Public inputs the join-split circuit would expose
    pub fn record(&self) -> InnerResult<InnerProofRecord> {
        for notes in [&self.input_notes, &self.output_notes] {
            if notes.len() > 2 {
                return Err(InnerProofError::TooManyNotes(notes.len()));
            }
            if let Some(note) = notes.iter().find(|n| n.asset_id != self.asset_id) {
                return Err(InnerProofError::AssetMismatch {
                    expected: self.asset_id,
                    found: note.asset_id,
                });
            }
        }

        let inputs = self.public_input as u128
            + self.input_notes.iter().map(|n| n.value as u128).sum::<u128>();
        let outputs = self.public_output as u128
            + self.output_notes.iter().map(|n| n.value as u128).sum::<u128>();
        if inputs < outputs {
            return Err(InnerProofError::Unbalanced { inputs, outputs });
        }

        let nullifier = |i: usize| {
            self.input_notes
                .get(i)
                .map_or(DIGEST_ZERO, |n| n.nullifier(&self.spending_key))
        };
        let note = |i: usize| self.output_notes.get(i).map_or(DIGEST_ZERO, ValueNote::commitment);

        Ok(InnerProofRecord {
            kind: ProofKind::JoinSplit,
            public_input: check_amount(self.public_input as u128)?,
            public_output: check_amount(self.public_output as u128)?,
            asset_id: self.asset_id,
            new_note1: note(0),
            new_note2: note(1),
            nullifier1: nullifier(0),
            nullifier2: nullifier(1),
            input_owner: self.input_owner,
            output_owner: self.output_owner,
            tx_fee: check_amount(inputs - outputs)?,
            interaction_nonce: 0,
        })
    }
}

/// An account registration, optionally migrating (nullifying) the alias
#[derive(Debug, Clone)]
pub struct AccountTx {
    pub alias_id: u64,
    pub owner_key: Digest,
    pub signing_keys: [Digest; 2],
    pub migrate: bool,
}

impl AccountTx {
    pub fn record(&self) -> InnerProofRecord {
        let note = |signing_key: Digest| {
            AccountNote {
                alias_id: self.alias_id,
                owner_key: self.owner_key,
                signing_key,
            }
            .commitment()
        };

        InnerProofRecord {
            kind: ProofKind::Account,
            new_note1: note(self.signing_keys[0]),
            new_note2: note(self.signing_keys[1]),
            nullifier1: if self.migrate {
                alias_nullifier(self.alias_id)
            } else {
                DIGEST_ZERO
            },
            input_owner: self.owner_key,
            ..InnerProofRecord::padding()
        }
    }
}

/// A bridge claim paying out one note
#[derive(Debug, Clone)]
pub struct ClaimTx {
    pub interaction_nonce: u64,
    pub output_note: ValueNote,
    pub fee: u64,
}

impl ClaimTx {
    pub fn record(&self) -> InnerResult<InnerProofRecord> {
        Ok(InnerProofRecord {
            kind: ProofKind::Claim,
            asset_id: self.output_note.asset_id,
            new_note1: self.output_note.commitment(),
            nullifier1: claim_nullifier(self.interaction_nonce, &self.output_note.owner),
            output_owner: self.output_note.owner,
            tx_fee: check_amount(self.fee as u128)?,
            interaction_nonce: self.interaction_nonce,
            ..InnerProofRecord::padding()
        })
    }
}
