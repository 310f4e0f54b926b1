//! Sequence prediction for the agent's environment model.
//!
//! The model is a binary Context Tree Weighting (CTW) mixture over every
//! prediction suffix tree up to a fixed depth. All probabilities are kept as
//! base-2 logarithms.

pub mod ctw;

pub use ctw::{ContextTree, ContextTreeStats, CtNode};
