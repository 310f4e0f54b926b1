//! MC-AIXI-CTW core library.
//!
//! This library provides:
//! - The context-tree-weighting predictor (`predict`)
//! - Monte-Carlo tree search over the learned model (`search`)
//! - The agent that ties model, history and planner together (`agent`)
//! - Reference environments and the experiment driver
//! - Exit codes, configuration loading and structured logging for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod agent;
pub mod config;
pub mod environment;
pub mod exit_codes;
pub mod experiment;
pub mod logging;
pub mod predict;
pub mod search;

pub use agent::{Agent, ModelUndo};
pub use environment::{build_environment, Environment};
pub use predict::ContextTree;
pub use search::search;
