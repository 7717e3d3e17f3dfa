//! Fixed-depth sparse Merkle tree over Rescue digests
//!
//! Empty leaves are [`DIGEST_ZERO`]; an empty subtree of height `h` hashes to
//! the `h`-th default node. Only nodes that differ from their default are
//! stored, so deep trees cost memory proportional to what has been written.

use std::collections::HashMap;

use rollup_stark_primitives::{digest_is_zero, rescue_hash_pair, Digest, DIGEST_ZERO};

use crate::config::MAX_TREE_DEPTH;
use crate::error::TreeError;

/// Authentication path from a leaf to the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashPath {
    pub index: u64,
    /// Siblings ordered from the leaf level upwards
    pub siblings: Vec<Digest>,
}

impl HashPath {
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Whether the node at `level` is a right child
    pub fn is_right(&self, level: usize) -> bool {
        (self.index >> level) & 1 == 1
    }

    /// Fold a leaf up the path
    pub fn compute_root(&self, leaf: &Digest) -> Digest {
        let mut node = *leaf;
        for (level, sibling) in self.siblings.iter().enumerate() {
            node = if self.is_right(level) {
                rescue_hash_pair(sibling, &node)
            } else {
                rescue_hash_pair(&node, sibling)
            };
        }
        node
    }

    pub fn verify(&self, root: &Digest, leaf: &Digest) -> bool {
        self.compute_root(leaf) == *root
    }
}

/// Roots of empty subtrees, indexed by height
fn default_nodes(depth: usize) -> Vec<Digest> {
    let mut nodes = Vec::with_capacity(depth + 1);
    nodes.push(DIGEST_ZERO);
    for level in 0..depth {
        let below = nodes[level];
        nodes.push(rescue_hash_pair(&below, &below));
    }
    nodes
}

#[derive(Debug, Clone)]
pub struct SparseMerkleTree {
    depth: usize,
    /// Non-default nodes keyed by (height, index at that height)
    nodes: HashMap<(usize, u64), Digest>,
    defaults: Vec<Digest>,
    /// One past the highest index ever appended or reserved
    size: u64,
}

impl SparseMerkleTree {
    pub fn new(depth: usize) -> Result<Self, TreeError> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(TreeError::InvalidDepth(depth));
        }
        Ok(Self {
            depth,
            nodes: HashMap::new(),
            defaults: default_nodes(depth),
            size: 0,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of leaf positions
    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of non-empty leaves
    pub fn num_occupied(&self) -> usize {
        self.nodes
            .iter()
            .filter(|((height, _), leaf)| *height == 0 && !digest_is_zero(leaf))
            .count()
    }

    pub fn root(&self) -> Digest {
        self.node(self.depth, 0)
    }

    /// Root of a tree of this depth with no leaves set
    pub fn empty_root(&self) -> Digest {
        self.defaults[self.depth]
    }

    fn node(&self, height: usize, index: u64) -> Digest {
        self.nodes
            .get(&(height, index))
            .copied()
            .unwrap_or(self.defaults[height])
    }

    fn check_index(&self, index: u64) -> Result<(), TreeError> {
        if index >= self.capacity() {
            return Err(TreeError::OutOfRange {
                index,
                depth: self.depth,
            });
        }
        Ok(())
    }

    pub fn leaf(&self, index: u64) -> Result<Digest, TreeError> {
        self.check_index(index)?;
        Ok(self.node(0, index))
    }

    pub fn hash_path(&self, index: u64) -> Result<HashPath, TreeError> {
        self.check_index(index)?;
        let siblings = (0..self.depth)
            .map(|height| self.node(height, (index >> height) ^ 1))
            .collect();
        Ok(HashPath { index, siblings })
    }

    /// Set a leaf and return the new root
    ///
    /// Writing a non-empty leaf extends `size` past `index`.
    pub fn update(&mut self, index: u64, leaf: Digest) -> Result<Digest, TreeError> {
        self.check_index(index)?;

        self.set_node(0, index, leaf);
        let mut position = index;
        for height in 1..=self.depth {
            position >>= 1;
            let left = self.node(height - 1, 2 * position);
            let right = self.node(height - 1, 2 * position + 1);
            self.set_node(height, position, rescue_hash_pair(&left, &right));
        }

        if !digest_is_zero(&leaf) {
            self.size = self.size.max(index + 1);
        }
        Ok(self.root())
    }

    /// Append at the next free position
    pub fn append(&mut self, leaf: Digest) -> Result<u64, TreeError> {
        let index = self.size;
        self.update(index, leaf)?;
        self.size = index + 1;
        Ok(index)
    }

    /// Extend `size` to at least `size` without writing leaves
    pub fn reserve(&mut self, size: u64) -> Result<(), TreeError> {
        if size > self.capacity() {
            return Err(TreeError::OutOfRange {
                index: size - 1,
                depth: self.depth,
            });
        }
        self.size = self.size.max(size);
        Ok(())
    }

    fn set_node(&mut self, height: usize, index: u64, value: Digest) {
        if value == self.defaults[height] {
            self.nodes.remove(&(height, index));
        } else {
            self.nodes.insert((height, index), value);
        }
    }
}
