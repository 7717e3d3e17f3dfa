//! Constraint groups of the rollup AIR
//!
//! Round constraints come from `rollup_stark_air::rescue_air`; the groups here
//! tie the two hash chains to the schedule, the running roots and the fees.

pub mod fees;
pub mod merkle;
pub mod roots;

pub use fees::{evaluate_fee_constraints, fee_constraint_degrees, NUM_FEE_CONSTRAINTS};
pub use merkle::{absorb_constraint_degrees, evaluate_absorb_constraints, Chain, NUM_ABSORB_CONSTRAINTS};
pub use roots::{evaluate_root_constraints, root_constraint_degrees, NUM_ROOT_CONSTRAINTS};
