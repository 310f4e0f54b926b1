//! MC-AIXI math utilities.
//!
//! Everything here works in base-2 logarithms, the unit the context tree
//! and the planner use for probabilities.

pub mod math;

pub use math::kt::*;
pub use math::stable::*;
