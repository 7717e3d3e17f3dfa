//! Batch assembler
//!
//! Resolves the circuit width, aligns the data-tree insertion block, pads the
//! batch and produces the per-slot Merkle witnesses the rollup AIR consumes.

mod batch;
mod width;

pub use batch::{build_batch, BatchAssembler, RollupBatch, SlotWitness};
pub use width::{aligned_start_index, resolve_width};
