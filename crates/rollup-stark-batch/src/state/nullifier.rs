//! Nullifier set as an indexed sparse Merkle tree
//!
//! A nullifier lives at index `nullifier[0] mod 2^depth` and the leaf holds the
//! full digest. Index 0 is reserved: the zero nullifier of an unused input maps
//! there and writing it is a no-op.

use rollup_stark_primitives::{digest_is_zero, felt_to_u64, Digest, DIGEST_ZERO};

use crate::error::TreeError;
use crate::state::tree::{HashPath, SparseMerkleTree};

/// Tree index of a nullifier
pub fn nullifier_index(nullifier: &Digest, depth: usize) -> u64 {
    let mask = (1u64 << depth) - 1;
    felt_to_u64(nullifier[0]) & mask
}

#[derive(Debug, Clone)]
pub struct NullifierSet {
    tree: SparseMerkleTree,
}

impl NullifierSet {
    pub fn new(depth: usize) -> Result<Self, TreeError> {
        Ok(Self {
            tree: SparseMerkleTree::new(depth)?,
        })
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    pub fn root(&self) -> Digest {
        self.tree.root()
    }

    /// Number of stored nullifiers
    pub fn len(&self) -> usize {
        self.tree.num_occupied()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index_of(&self, nullifier: &Digest) -> u64 {
        nullifier_index(nullifier, self.tree.depth())
    }

    pub fn contains(&self, nullifier: &Digest) -> bool {
        !digest_is_zero(nullifier) && self.leaf_at(self.index_of(nullifier)) == *nullifier
    }

    /// Whether the slot for `nullifier` is still empty
    ///
    /// False when the nullifier was already spent or another nullifier
    /// collides with it.
    pub fn is_free(&self, nullifier: &Digest) -> bool {
        digest_is_zero(&self.leaf_at(self.index_of(nullifier)))
    }

    /// Insert a nullifier; returns false and leaves the set untouched when
    /// its slot is taken, it is zero or it maps to the reserved index
    pub fn insert(&mut self, nullifier: Digest) -> bool {
        let index = self.index_of(&nullifier);
        if digest_is_zero(&nullifier) || index == 0 || !self.is_free(&nullifier) {
            return false;
        }
        self.tree.update(index, nullifier).is_ok()
    }

    pub fn hash_path(&self, index: u64) -> Result<HashPath, TreeError> {
        self.tree.hash_path(index)
    }

    pub(crate) fn tree(&self) -> &SparseMerkleTree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut SparseMerkleTree {
        &mut self.tree
    }

    fn leaf_at(&self, index: u64) -> Digest {
        // Masked indices are always in range
        self.tree.leaf(index).unwrap_or(DIGEST_ZERO)
    }
}
