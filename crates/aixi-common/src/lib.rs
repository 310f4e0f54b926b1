//! MC-AIXI common types and errors.
//!
//! This crate provides the foundational types shared by the agent crates:
//! - Binary symbols and the action/observation/reward value types
//! - The fixed-width LSB-first symbol codec
//! - Common error types with stable codes
//! - Output format specifications for the CLI

pub mod codec;
pub mod error;
pub mod output;
pub mod symbol;

pub use codec::{bits_required, decode, encode, encode_into, max_value, try_encode_into};
pub use error::{Error, ErrorCategory, Result};
pub use output::OutputFormat;
pub use symbol::{Action, Observation, Percept, Reward, Symbol};

/// Schema version for JSON payloads written by the CLI and telemetry sinks.
pub const SCHEMA_VERSION: &str = "1.0.0";
