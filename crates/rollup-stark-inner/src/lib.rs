//! Inner transaction proofs as seen by the rollup
//!
//! The rollup consumes already-generated proofs of three kinds (join-split,
//! account, claim). This crate fixes their public-input contract and decodes
//! it; verification of the proofs themselves goes through the
//! [`InnerProofSystem`] trait.
//!
//! - `kind`: the closed set of proof kinds and their tags
//! - `layout`: public-input positions shared by every kind
//! - `record`: the decoded public inputs
//! - `decoder`: raw bytes to records, shape checks only
//! - `note`: note commitments and nullifier derivation
//! - `keys`: verification keys and the proof system seam
//! - `mock`: a hash-commitment proof system and transaction builders

pub mod decoder;
pub mod error;
pub mod keys;
pub mod kind;
pub mod layout;
pub mod mock;
pub mod note;
pub mod record;

pub use decoder::{decode_inner_proof, decode_raw, encode_inner_proof, InnerProof, RawInnerProof};
pub use error::{InnerProofError, InnerResult};
pub use keys::{InnerProofSystem, VerificationKey, VerificationKeySet};
pub use kind::ProofKind;
pub use layout::{NUM_ASSETS, NUM_INNER_PUBLIC_INPUTS};
pub use mock::{derive_key, AccountTx, ClaimTx, HashProofSystem, JoinSplitTx};
pub use note::{AccountNote, ValueNote};
pub use record::InnerProofRecord;
