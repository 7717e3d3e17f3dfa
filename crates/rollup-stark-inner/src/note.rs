//! Note commitments and nullifiers
//!
//! These are computed by the inner transaction circuits; the rollup only ever
//! sees the resulting digests. They live here so that fixtures and the mock
//! proof system produce the same values a real client would.

use rollup_stark_primitives::{felt_from_u64, rescue_hash, Digest, Felt};
use serde::{Deserialize, Serialize};

/// Domain separators, absorbed as the first element of each hash
mod domain {
    pub const VALUE_NOTE: u64 = 1;
    pub const ACCOUNT_NOTE: u64 = 2;
    pub const NOTE_NULLIFIER: u64 = 3;
    pub const ALIAS_NULLIFIER: u64 = 4;
    pub const CLAIM_NULLIFIER: u64 = 5;
}

/// A value note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueNote {
    #[serde(with = "rollup_stark_primitives::digest::hex_digest")]
    pub owner: Digest,
    pub value: u64,
    pub asset_id: u32,
    #[serde(with = "rollup_stark_primitives::digest::hex_digest")]
    pub secret: Digest,
    pub nonce: u64,
}

impl ValueNote {
    /// Commitment inserted into the data tree
    pub fn commitment(&self) -> Digest {
        let mut input = Vec::with_capacity(12);
        input.push(felt_from_u64(domain::VALUE_NOTE));
        input.extend_from_slice(&self.owner);
        input.push(felt_from_u64(self.value));
        input.push(felt_from_u64(self.asset_id as u64));
        input.extend_from_slice(&self.secret);
        input.push(felt_from_u64(self.nonce));
        rescue_hash(&input)
    }

    /// Nullifier revealed when the note is spent
    pub fn nullifier(&self, spending_key: &Digest) -> Digest {
        let mut input = Vec::with_capacity(9);
        input.push(felt_from_u64(domain::NOTE_NULLIFIER));
        input.extend_from_slice(&self.commitment());
        input.extend_from_slice(spending_key);
        rescue_hash(&input)
    }
}

/// An account registration note: (alias id, owner key, signing key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNote {
    pub alias_id: u64,
    #[serde(with = "rollup_stark_primitives::digest::hex_digest")]
    pub owner_key: Digest,
    #[serde(with = "rollup_stark_primitives::digest::hex_digest")]
    pub signing_key: Digest,
}

impl AccountNote {
    pub fn commitment(&self) -> Digest {
        let mut input: Vec<Felt> = Vec::with_capacity(10);
        input.push(felt_from_u64(domain::ACCOUNT_NOTE));
        input.push(felt_from_u64(self.alias_id));
        input.extend_from_slice(&self.owner_key);
        input.extend_from_slice(&self.signing_key);
        rescue_hash(&input)
    }
}

/// Nullifier marking an alias as taken (account migration)
pub fn alias_nullifier(alias_id: u64) -> Digest {
    rescue_hash(&[felt_from_u64(domain::ALIAS_NULLIFIER), felt_from_u64(alias_id)])
}

/// Nullifier marking a bridge interaction as claimed
pub fn claim_nullifier(interaction_nonce: u64, owner: &Digest) -> Digest {
    let mut input = Vec::with_capacity(6);
    input.push(felt_from_u64(domain::CLAIM_NULLIFIER));
    input.push(felt_from_u64(interaction_nonce));
    input.extend_from_slice(owner);
    rescue_hash(&input)
}
