//! Rollup AIR (Algebraic Intermediate Representation)
//!
//! Trace layout, the public-input-derived update schedule, constraint groups
//! and the AIR tying them together.

pub mod constraints;
pub mod rollup_air;
pub mod schedule;
pub mod trace_layout;

pub use rollup_air::{RollupAir, MIN_BLOWUP_FACTOR, NUM_ROLLUP_CONSTRAINTS};
pub use schedule::{CycleColumns, ScheduledUpdate, UpdateSchedule};
pub use trace_layout::{cols, TRACE_WIDTH};
