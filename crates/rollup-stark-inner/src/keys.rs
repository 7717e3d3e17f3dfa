//! Verification keys and the inner proof system seam
//!
//! The rollup never looks inside an inner proof; it hands the raw bytes and the
//! key matching the declared kind to an [`InnerProofSystem`].

use rollup_stark_primitives::Hash256;
use serde::{Deserialize, Serialize};

use crate::kind::ProofKind;
use crate::layout::NUM_INNER_PUBLIC_INPUTS;

const VK_DOMAIN: &[u8] = b"ROLLUP_STARK_INNER_VK_V1";

/// Verification key of one inner circuit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey {
    pub kind: ProofKind,
    /// Identifier derived from the key material
    pub id: Hash256,
    pub num_public_inputs: usize,
}

impl VerificationKey {
    /// Build a key for `kind` from opaque key material
    pub fn new(kind: ProofKind, key_material: &[u8]) -> Self {
        let tag = kind.tag().to_le_bytes();
        Self {
            kind,
            id: Hash256::sha256_parts(VK_DOMAIN, &[&tag[..], key_material]),
            num_public_inputs: NUM_INNER_PUBLIC_INPUTS,
        }
    }
}

/// One verification key per supported inner proof kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKeySet {
    pub join_split: VerificationKey,
    pub account: VerificationKey,
    pub claim: VerificationKey,
}

impl VerificationKeySet {
    /// Key for a proof kind
    pub fn for_kind(&self, kind: ProofKind) -> &VerificationKey {
        match kind {
            ProofKind::JoinSplit => &self.join_split,
            ProofKind::Account => &self.account,
            ProofKind::Claim => &self.claim,
        }
    }

    /// Every key sits in the slot of its own kind
    pub fn is_consistent(&self) -> bool {
        ProofKind::ALL.iter().all(|&kind| {
            let vk = self.for_kind(kind);
            vk.kind == kind && vk.num_public_inputs == NUM_INNER_PUBLIC_INPUTS
        })
    }
}

/// Verifier of inner transaction proofs
pub trait InnerProofSystem: Send + Sync {
    /// Check raw proof bytes (public inputs included) against a key
    fn verify(&self, proof: &[u8], vk: &VerificationKey) -> bool;
}
