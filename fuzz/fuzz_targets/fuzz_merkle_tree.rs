//! Fuzz target for the world state trees
//!
//! This target ensures:
//! 1. Note appends and nullifier inserts never panic
//! 2. Every hash path verifies against the current root
//! 3. A rejected nullifier insert never moves the nullifier root

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rollup_stark_batch::{TreeDepths, WorldState};
use rollup_stark_primitives::{felt_from_u64, rescue_hash};

#[derive(Debug, Arbitrary)]
enum Op {
    InsertNote(u64),
    InsertNullifier(u64),
    SnapshotRoots,
}

fuzz_target!(|ops: Vec<Op>| {
    let depths = TreeDepths {
        data: 6,
        nullifier: 10,
        roots: 4,
    };
    let Ok(mut state) = WorldState::new(&depths) else {
        return;
    };

    for op in ops.into_iter().take(64) {
        match op {
            Op::InsertNote(n) => {
                let note = rescue_hash(&[felt_from_u64(n)]);
                if let Ok(index) = state.insert_note(note) {
                    let path = state.data_hash_path(index).expect("written index is in range");
                    assert!(path.verify(&state.data_root(), &note));
                }
            }
            Op::InsertNullifier(n) => {
                let nullifier = rescue_hash(&[felt_from_u64(n), felt_from_u64(1)]);
                let before = state.nullifier_root();
                if state.insert_nullifier(nullifier) {
                    let index = state.nullifiers().index_of(&nullifier);
                    let path = state.nullifier_hash_path(index).expect("masked index is in range");
                    assert!(path.verify(&state.nullifier_root(), &nullifier));
                    assert!(state.contains_nullifier(&nullifier));
                } else {
                    assert_eq!(state.nullifier_root(), before);
                }
            }
            Op::SnapshotRoots => {
                let _ = state.snapshot_root_tree();
            }
        }
    }
});
