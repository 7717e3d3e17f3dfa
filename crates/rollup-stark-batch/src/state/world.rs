//! The rollup world state: data, nullifier and roots trees
//!
//! Batches are built against a fork and produce a [`StateTransition`]. The
//! live state only changes through [`WorldState::commit`], which refuses a
//! transition built against an older version and leaves the state untouched
//! on any failure.

use std::fmt;

use rollup_stark_primitives::digest::hex_digest;
use rollup_stark_primitives::{digest_is_zero, digest_to_hex, Digest};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TreeDepths;
use crate::error::{StateError, TreeError};
use crate::state::nullifier::NullifierSet;
use crate::state::tree::{HashPath, SparseMerkleTree};

/// The three state trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeId {
    Data,
    Nullifier,
    Roots,
}

impl TreeId {
    pub const ALL: [TreeId; 3] = [TreeId::Data, TreeId::Nullifier, TreeId::Roots];

    pub const fn name(self) -> &'static str {
        match self {
            TreeId::Data => "data",
            TreeId::Nullifier => "nullifier",
            TreeId::Roots => "roots",
        }
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Roots of the three trees at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRoots {
    #[serde(with = "hex_digest")]
    pub data: Digest,
    #[serde(with = "hex_digest")]
    pub nullifier: Digest,
    #[serde(with = "hex_digest")]
    pub roots: Digest,
}

impl StateRoots {
    pub fn get(&self, tree: TreeId) -> Digest {
        match tree {
            TreeId::Data => self.data,
            TreeId::Nullifier => self.nullifier,
            TreeId::Roots => self.roots,
        }
    }
}

/// A single leaf write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafWrite {
    pub tree: TreeId,
    pub index: u64,
    pub leaf: Digest,
}

/// A leaf write together with its authentication witness
///
/// `path` is taken before the write; the same siblings authenticate
/// `old_leaf` under `old_root` and `new_leaf` under `new_root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafUpdate {
    pub tree: TreeId,
    pub index: u64,
    pub old_leaf: Digest,
    pub new_leaf: Digest,
    pub path: HashPath,
    pub old_root: Digest,
    pub new_root: Digest,
}

impl LeafUpdate {
    /// Writing the value already present
    pub fn is_noop(&self) -> bool {
        self.old_leaf == self.new_leaf
    }

    /// Whether the path authenticates both sides of the update
    pub fn is_consistent(&self) -> bool {
        self.path.index == self.index
            && self.path.verify(&self.old_root, &self.old_leaf)
            && self.path.verify(&self.new_root, &self.new_leaf)
    }
}

/// The state change of one batch, applied with [`WorldState::commit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    /// Version of the state the transition was built against
    pub base_version: u64,
    pub old_roots: StateRoots,
    pub new_roots: StateRoots,
    /// Non-empty leaf writes in application order
    pub writes: Vec<LeafWrite>,
    /// Data tree size after the batch, including skipped alignment leaves
    pub new_data_size: u64,
}

/// Opaque copy of a world state for rollback
#[derive(Debug, Clone)]
pub struct WorldStateSnapshot(WorldState);

#[derive(Debug, Clone)]
pub struct WorldState {
    depths: TreeDepths,
    data: SparseMerkleTree,
    nullifiers: NullifierSet,
    roots: SparseMerkleTree,
    version: u64,
}

impl WorldState {
    /// Empty state; the roots tree starts with the empty data root at index 0
    pub fn new(depths: &TreeDepths) -> Result<Self, TreeError> {
        depths.validate()?;
        let data = SparseMerkleTree::new(depths.data)?;
        let nullifiers = NullifierSet::new(depths.nullifier)?;
        let mut roots = SparseMerkleTree::new(depths.roots)?;
        roots.append(data.root())?;

        Ok(Self {
            depths: depths.clone(),
            data,
            nullifiers,
            roots,
            version: 0,
        })
    }

    pub fn depths(&self) -> &TreeDepths {
        &self.depths
    }

    /// Incremented by every mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn data_root(&self) -> Digest {
        self.data.root()
    }

    pub fn nullifier_root(&self) -> Digest {
        self.nullifiers.root()
    }

    pub fn roots_root(&self) -> Digest {
        self.roots.root()
    }

    pub fn roots(&self) -> StateRoots {
        StateRoots {
            data: self.data_root(),
            nullifier: self.nullifier_root(),
            roots: self.roots_root(),
        }
    }

    pub fn data_size(&self) -> u64 {
        self.data.size()
    }

    pub fn roots_size(&self) -> u64 {
        self.roots.size()
    }

    /// Id of the next batch; batch `b` writes roots-tree index `b + 1`
    pub fn next_batch_id(&self) -> u64 {
        self.roots.size().saturating_sub(1)
    }

    pub fn data_leaf(&self, index: u64) -> Result<Digest, TreeError> {
        self.data.leaf(index)
    }

    pub fn roots_leaf(&self, index: u64) -> Result<Digest, TreeError> {
        self.roots.leaf(index)
    }

    pub fn data_hash_path(&self, index: u64) -> Result<HashPath, TreeError> {
        self.data.hash_path(index)
    }

    pub fn nullifier_hash_path(&self, index: u64) -> Result<HashPath, TreeError> {
        self.nullifiers.hash_path(index)
    }

    pub fn roots_hash_path(&self, index: u64) -> Result<HashPath, TreeError> {
        self.roots.hash_path(index)
    }

    pub fn nullifiers(&self) -> &NullifierSet {
        &self.nullifiers
    }

    pub fn contains_nullifier(&self, nullifier: &Digest) -> bool {
        self.nullifiers.contains(nullifier)
    }

    /// Append a note commitment to the data tree
    pub fn insert_note(&mut self, note: Digest) -> Result<u64, TreeError> {
        let index = self.data.append(note)?;
        self.version += 1;
        Ok(index)
    }

    pub fn insert_nullifier(&mut self, nullifier: Digest) -> bool {
        let inserted = self.nullifiers.insert(nullifier);
        if inserted {
            self.version += 1;
        }
        inserted
    }

    /// Append the current data root to the roots tree
    pub fn snapshot_root_tree(&mut self) -> Result<u64, TreeError> {
        let index = self.roots.append(self.data.root())?;
        self.version += 1;
        Ok(index)
    }

    /// Independent copy for building a batch
    pub fn fork(&self) -> WorldState {
        self.clone()
    }

    pub fn snapshot(&self) -> WorldStateSnapshot {
        WorldStateSnapshot(self.clone())
    }

    pub fn restore(&mut self, snapshot: WorldStateSnapshot) {
        *self = snapshot.0;
    }

    fn tree_mut(&mut self, tree: TreeId) -> &mut SparseMerkleTree {
        match tree {
            TreeId::Data => &mut self.data,
            TreeId::Nullifier => self.nullifiers.tree_mut(),
            TreeId::Roots => &mut self.roots,
        }
    }

    fn tree(&self, tree: TreeId) -> &SparseMerkleTree {
        match tree {
            TreeId::Data => &self.data,
            TreeId::Nullifier => self.nullifiers.tree(),
            TreeId::Roots => &self.roots,
        }
    }

    /// Write an empty leaf and record the witness of the write
    pub(crate) fn write_with_witness(
        &mut self,
        tree: TreeId,
        index: u64,
        leaf: Digest,
    ) -> Result<LeafUpdate, TreeError> {
        let target = self.tree(tree);
        let old_root = target.root();
        let path = target.hash_path(index)?;
        let old_leaf = target.leaf(index)?;
        if !digest_is_zero(&old_leaf) {
            return Err(TreeError::LeafOccupied { index });
        }
        let new_root = self.tree_mut(tree).update(index, leaf)?;
        self.version += 1;

        Ok(LeafUpdate {
            tree,
            index,
            old_leaf,
            new_leaf: leaf,
            path,
            old_root,
            new_root,
        })
    }

    pub(crate) fn reserve_data(&mut self, size: u64) -> Result<(), TreeError> {
        self.data.reserve(size)
    }

    /// Apply a transition built against this state
    ///
    /// On success the version advances by one. On failure the state is
    /// exactly as before the call.
    pub fn commit(&mut self, transition: &StateTransition) -> Result<(), StateError> {
        if transition.base_version != self.version {
            warn!(
                expected = transition.base_version,
                actual = self.version,
                "rejecting stale state transition"
            );
            return Err(StateError::StaleVersion {
                expected: transition.base_version,
                actual: self.version,
            });
        }

        let current = self.roots();
        for tree in TreeId::ALL {
            if current.get(tree) != transition.old_roots.get(tree) {
                return Err(StateError::RootMismatch { tree });
            }
        }

        let backup = self.snapshot();
        if let Err(e) = self.apply(transition) {
            self.restore(backup);
            return Err(e);
        }

        self.version = transition.base_version + 1;
        debug!(
            version = self.version,
            data_root = %digest_to_hex(&self.data_root()),
            writes = transition.writes.len(),
            "committed state transition"
        );
        Ok(())
    }

    fn apply(&mut self, transition: &StateTransition) -> Result<(), StateError> {
        for write in &transition.writes {
            self.tree_mut(write.tree).update(write.index, write.leaf)?;
        }
        self.data.reserve(transition.new_data_size)?;

        let reached = self.roots();
        for tree in TreeId::ALL {
            if reached.get(tree) != transition.new_roots.get(tree) {
                return Err(StateError::InconsistentTransition { tree });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollup_stark_primitives::{felt_from_u64, rescue_hash, DIGEST_ZERO};

    fn note(n: u64) -> Digest {
        rescue_hash(&[felt_from_u64(n)])
    }

    fn state() -> WorldState {
        WorldState::new(&TreeDepths { data: 6, nullifier: 12, roots: 4 }).unwrap()
    }

    #[test]
    fn test_genesis() {
        let s = state();
        assert_eq!(s.version(), 0);
        assert_eq!(s.data_size(), 0);
        assert_eq!(s.roots_size(), 1);
        assert_eq!(s.next_batch_id(), 0);
        assert_eq!(s.roots_leaf(0).unwrap(), s.data_root());
    }

    #[test]
    fn test_mutations_bump_version() {
        let mut s = state();
        assert_eq!(s.insert_note(note(1)).unwrap(), 0);
        assert_eq!(s.insert_note(note(2)).unwrap(), 1);
        assert_eq!(s.version(), 2);

        let n = note(3);
        assert!(s.insert_nullifier(n));
        assert!(!s.insert_nullifier(n));
        assert!(s.contains_nullifier(&n));
        assert_eq!(s.version(), 3);

        assert_eq!(s.snapshot_root_tree().unwrap(), 1);
        assert_eq!(s.next_batch_id(), 1);
        assert_eq!(s.version(), 4);
    }

    fn transition_for(s: &WorldState, notes: &[Digest]) -> StateTransition {
        let mut fork = s.fork();
        let start = fork.data_size();
        let mut writes = Vec::new();
        for (i, n) in notes.iter().enumerate() {
            let update = fork.write_with_witness(TreeId::Data, start + i as u64, *n).unwrap();
            assert!(update.is_consistent());
            writes.push(LeafWrite { tree: TreeId::Data, index: update.index, leaf: *n });
        }
        StateTransition {
            base_version: s.version(),
            old_roots: s.roots(),
            new_roots: fork.roots(),
            writes,
            new_data_size: start + notes.len() as u64,
        }
    }

    #[test]
    fn test_commit_applies_transition() {
        let mut s = state();
        let transition = transition_for(&s, &[note(10), note(11)]);
        s.commit(&transition).unwrap();
        assert_eq!(s.version(), 1);
        assert_eq!(s.roots(), transition.new_roots);
        assert_eq!(s.data_size(), 2);
        assert_eq!(s.data_leaf(1).unwrap(), note(11));
    }

    #[test]
    fn test_stale_commit_rejected() {
        let mut s = state();
        let transition = transition_for(&s, &[note(10)]);
        s.insert_note(note(99)).unwrap();
        let before = s.roots();
        assert_eq!(
            s.commit(&transition),
            Err(StateError::StaleVersion { expected: 0, actual: 1 })
        );
        assert_eq!(s.roots(), before);
        assert_eq!(s.version(), 1);
    }

    #[test]
    fn test_second_commit_of_same_transition_rejected() {
        let mut s = state();
        let transition = transition_for(&s, &[note(10)]);
        s.commit(&transition).unwrap();
        assert!(matches!(s.commit(&transition), Err(StateError::StaleVersion { .. })));
    }

    #[test]
    fn test_inconsistent_transition_restores_state() {
        let mut s = state();
        let mut transition = transition_for(&s, &[note(10)]);
        transition.new_roots.data = DIGEST_ZERO;
        let before = s.roots();
        assert_eq!(
            s.commit(&transition),
            Err(StateError::InconsistentTransition { tree: TreeId::Data })
        );
        assert_eq!(s.roots(), before);
        assert_eq!(s.data_size(), 0);
        assert_eq!(s.version(), 0);
    }

    #[test]
    fn test_write_with_witness_rejects_occupied_leaf() {
        let mut s = state();
        s.insert_note(note(1)).unwrap();
        assert_eq!(
            s.write_with_witness(TreeId::Data, 0, note(2)),
            Err(TreeError::LeafOccupied { index: 0 })
        );
    }

    #[test]
    fn test_snapshot_restore() {
        let mut s = state();
        let snapshot = s.snapshot();
        s.insert_note(note(5)).unwrap();
        s.restore(snapshot);
        assert_eq!(s.data_size(), 0);
        assert_eq!(s.version(), 0);
    }
}
