//! Trace layout for rollup proofs
//!
//! The trace is a sequence of 8-row hash cycles. Each cycle hashes one Merkle
//! node on two chains at once: the "old" chain folds an empty leaf up a path
//! and the "new" chain folds the written leaf up the same path. Rows 0..7 of
//! a cycle are Rescue rounds; the row after a cycle's last round absorbs the
//! next node (or a fresh leaf) into both states.
//!
//! Schedule columns (start flag, direction bit, leaf, end flags and fee
//! increment) are bound by assertions on the first row of every cycle and
//! are only read from there.

use rollup_stark_air::HASH_CYCLE_LEN;
use rollup_stark_inner::NUM_ASSETS;
use rollup_stark_primitives::rescue::STATE_WIDTH;
use rollup_stark_primitives::DIGEST_SIZE;

use crate::state::TreeId;

/// Total width of the rollup execution trace
pub const TRACE_WIDTH: usize = cols::FEE_INC + NUM_ASSETS;

/// Smallest trace: two cycles, so every sequence assertion has a stride
pub const MIN_TRACE_LENGTH: usize = 2 * HASH_CYCLE_LEN;

/// Column indices for the rollup trace
pub mod cols {
    use super::{TreeId, DIGEST_SIZE, NUM_ASSETS, STATE_WIDTH};

    // =========================================================================
    // Hash states (24 columns)
    // =========================================================================
    /// Rescue state of the old chain
    pub const OLD_STATE: usize = 0;

    /// Rescue state of the new chain
    pub const NEW_STATE: usize = OLD_STATE + STATE_WIDTH;

    // =========================================================================
    // Path witness (5 columns)
    // =========================================================================
    /// Sibling digest absorbed at the start of the cycle
    pub const SIBLING: usize = NEW_STATE + STATE_WIDTH;

    /// 1 when the node hashed in this cycle is a right child
    pub const BIT: usize = SIBLING + DIGEST_SIZE;

    // =========================================================================
    // Schedule (8 columns)
    // =========================================================================
    /// 1 on the first cycle of an update
    pub const START: usize = BIT + 1;

    /// Leaf written by the update starting in this cycle
    pub const NEW_LEAF: usize = START + 1;

    /// 1 on the cycle after the last cycle of a data-tree update
    pub const END_DATA: usize = NEW_LEAF + DIGEST_SIZE;

    /// Same for the nullifier tree
    pub const END_NULLIFIER: usize = END_DATA + 1;

    /// Same for the roots tree
    pub const END_ROOTS: usize = END_NULLIFIER + 1;

    // =========================================================================
    // Running roots (12 columns)
    // =========================================================================
    pub const DATA_ROOT: usize = END_ROOTS + 1;
    pub const NULLIFIER_ROOT: usize = DATA_ROOT + DIGEST_SIZE;
    pub const ROOTS_ROOT: usize = NULLIFIER_ROOT + DIGEST_SIZE;

    // =========================================================================
    // Fees (8 columns)
    // =========================================================================
    /// Running fee total per asset
    pub const FEES: usize = ROOTS_ROOT + DIGEST_SIZE;

    /// Fee added when entering this cycle, per asset
    pub const FEE_INC: usize = FEES + NUM_ASSETS;

    pub const fn old_state(i: usize) -> usize {
        OLD_STATE + i
    }

    pub const fn new_state(i: usize) -> usize {
        NEW_STATE + i
    }

    pub const fn sibling(i: usize) -> usize {
        SIBLING + i
    }

    pub const fn new_leaf(i: usize) -> usize {
        NEW_LEAF + i
    }

    pub const fn fee(asset: usize) -> usize {
        FEES + asset
    }

    pub const fn fee_inc(asset: usize) -> usize {
        FEE_INC + asset
    }

    pub const fn end_flag(tree: TreeId) -> usize {
        match tree {
            TreeId::Data => END_DATA,
            TreeId::Nullifier => END_NULLIFIER,
            TreeId::Roots => END_ROOTS,
        }
    }

    /// First column of a tree's running root
    pub const fn root(tree: TreeId) -> usize {
        match tree {
            TreeId::Data => DATA_ROOT,
            TreeId::Nullifier => NULLIFIER_ROOT,
            TreeId::Roots => ROOTS_ROOT,
        }
    }
}
