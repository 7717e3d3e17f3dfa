//! Rollup STARK AIR building blocks
//!
//! - `options`: proof option presets and validation
//! - `rescue_air`: Rescue-Prime round constraints and their periodic columns,
//!   shared by every AIR that re-enforces Merkle hashing

pub mod options;
pub mod rescue_air;

pub use options::{OptionsError, ProofOptions};
pub use rescue_air::HASH_CYCLE_LEN;
