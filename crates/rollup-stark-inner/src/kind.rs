//! Inner proof kinds
//!
//! The rollup accepts a closed set of inner proof types. Each carries its own
//! verification key; dispatch is a `match` on the tag.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InnerProofError;

/// Type of an inner transaction proof
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofKind {
    /// Value transfer: spends up to two notes, creates up to two notes
    JoinSplit,
    /// Account key registration or alias migration
    Account,
    /// Bridge claim for a cross-batch interaction
    Claim,
}

impl ProofKind {
    /// All kinds, in tag order
    pub const ALL: [ProofKind; 3] = [ProofKind::JoinSplit, ProofKind::Account, ProofKind::Claim];

    /// Tag stored in the first public input
    pub const fn tag(self) -> u64 {
        match self {
            ProofKind::JoinSplit => 0,
            ProofKind::Account => 1,
            ProofKind::Claim => 2,
        }
    }

    /// Parse a tag
    pub fn from_tag(tag: u64) -> Result<Self, InnerProofError> {
        match tag {
            0 => Ok(ProofKind::JoinSplit),
            1 => Ok(ProofKind::Account),
            2 => Ok(ProofKind::Claim),
            other => Err(InnerProofError::UnknownKind(other)),
        }
    }

    /// Human readable name
    pub const fn name(self) -> &'static str {
        match self {
            ProofKind::JoinSplit => "join-split",
            ProofKind::Account => "account",
            ProofKind::Claim => "claim",
        }
    }

    /// Whether the interaction nonce position may be non-zero
    pub const fn has_interaction_nonce(self) -> bool {
        matches!(self, ProofKind::Claim)
    }
}

impl fmt::Display for ProofKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
