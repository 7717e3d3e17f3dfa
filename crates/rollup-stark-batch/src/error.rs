//! Error types for the rollup batch engine

use rollup_stark_air::OptionsError;
use rollup_stark_inner::{InnerProofError, ProofKind};
use thiserror::Error;

use crate::state::TreeId;

/// Errors raised by a single sparse Merkle tree
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Invalid tree depth {0} (must be 1..=63)")]
    InvalidDepth(usize),

    #[error("Index {index} out of range for tree of depth {depth}")]
    OutOfRange { index: u64, depth: usize },

    #[error("Leaf {index} is already occupied")]
    LeafOccupied { index: u64 },
}

/// Errors raised while decoding the rollup public-input vector
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Public input vector too short: {0} elements")]
    TooShort(usize),

    #[error("Invalid rollup width {0}")]
    InvalidWidth(u64),

    #[error("Length mismatch for width {width}: expected {expected} elements, got {actual}")]
    LengthMismatch {
        width: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid inner record in slot {slot}: {source}")]
    InvalidSlot {
        slot: usize,
        #[source]
        source: InnerProofError,
    },

    #[error("Value {value} at position {index} does not fit its field")]
    ValueOutOfRange { index: usize, value: u64 },

    #[error("Malformed proof bytes: {0}")]
    MalformedBytes(String),
}

/// Errors raised when committing a transition to the world state
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Stale transition: built against version {expected}, state is at version {actual}")]
    StaleVersion { expected: u64, actual: u64 },

    #[error("The {tree} root moved since the transition was built")]
    RootMismatch { tree: TreeId },

    #[error("Transition does not reproduce its declared {tree} root")]
    InconsistentTransition { tree: TreeId },

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Errors raised while assembling a batch
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Batch cannot be empty")]
    EmptyBatch,

    #[error("Batch of {count} proofs does not fit width {requested} (largest supported width is {max})")]
    BatchTooLarge {
        count: usize,
        requested: usize,
        max: usize,
    },

    #[error("Malformed inner proof in slot {slot}: {source}")]
    MalformedProof {
        slot: usize,
        #[source]
        source: InnerProofError,
    },

    #[error("Nullifier {nullifier} in slot {slot} maps to the reserved index 0")]
    ReservedNullifierIndex { slot: usize, nullifier: String },

    #[error("Double spend in slot {slot}: nullifier {nullifier}")]
    DoubleSpend { slot: usize, nullifier: String },

    #[error("Tree capacity exceeded: {0}")]
    OutOfRange(#[from] TreeError),

    #[error("Fee total for asset {asset_id} exceeds the field modulus")]
    FeeOverflow { asset_id: usize },

    #[error("Invalid padding proof: {0}")]
    InvalidPaddingProof(String),

    #[error("Invalid rollup configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised while proving a batch
#[derive(Debug, Error)]
pub enum ProofError {
    #[error("Inner {kind} proof in slot {slot} was rejected")]
    InnerProofRejected { slot: usize, kind: ProofKind },

    #[error("Width {0} is not supported by this circuit")]
    UnsupportedWidth(usize),

    #[error("Invalid proof options: {0}")]
    InvalidOptions(#[from] OptionsError),

    #[error("Invalid batch witness: {0}")]
    InvalidWitness(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Proof construction failed: {0}")]
    ProofConstruction(String),
}

/// Errors raised before a rollup proof can be checked at all
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Invalid proof options: {0}")]
    InvalidOptions(#[from] OptionsError),
}

/// Errors raised by the proof file formats
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u8),

    #[error("Input too short: needed {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid proof hash: {0}")]
    InvalidHash(String),

    #[error("Invalid proof metadata: {0}")]
    InvalidMetadata(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Result type for batch assembly
pub type BatchResult<T> = Result<T, BatchError>;

/// Result type for proving
pub type ProofResult<T> = Result<T, ProofError>;
