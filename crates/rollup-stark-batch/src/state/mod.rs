//! Rollup state model
//!
//! - `SparseMerkleTree`: fixed-depth Rescue Merkle tree with hash paths
//! - `NullifierSet`: nullifiers indexed by their first limb
//! - `WorldState`: the data, nullifier and roots trees with versioned commits

mod nullifier;
mod tree;
mod world;

pub use nullifier::{nullifier_index, NullifierSet};
pub use tree::{HashPath, SparseMerkleTree};
pub use world::{
    LeafUpdate, LeafWrite, StateRoots, StateTransition, TreeId, WorldState, WorldStateSnapshot,
};
