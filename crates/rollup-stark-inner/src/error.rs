//! Error types for inner proofs

use thiserror::Error;

use crate::kind::ProofKind;

/// Errors raised while decoding or constructing inner proofs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InnerProofError {
    #[error("proof truncated: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("wrong public input count: expected {expected}, got {actual}")]
    WrongElementCount { expected: usize, actual: usize },

    #[error("public input {index} is not a canonical field element")]
    NonCanonicalElement { index: usize },

    #[error("unknown proof kind tag {0}")]
    UnknownKind(u64),

    #[error("declared {declared} proof carries a {found} tag")]
    KindMismatch { declared: ProofKind, found: ProofKind },

    #[error("asset id {asset_id} out of range (max {max})")]
    AssetOutOfRange { asset_id: u64, max: usize },

    #[error("{0} proofs must not carry an interaction nonce")]
    UnexpectedInteractionNonce(ProofKind),

    #[error("transaction does not balance: inputs {inputs}, outputs {outputs}")]
    Unbalanced { inputs: u128, outputs: u128 },

    #[error("value {0} does not fit in a field element")]
    ValueOutOfRange(u128),

    #[error("a transaction takes at most 2 notes per side, got {0}")]
    TooManyNotes(usize),

    #[error("note asset {found} does not match transaction asset {expected}")]
    AssetMismatch { expected: u32, found: u32 },
}

/// Result type for inner proof operations
pub type InnerResult<T> = Result<T, InnerProofError>;
