//! Error types for the MC-AIXI crates.
//!
//! Operational failures at the edges of the system (configuration, environment
//! construction, telemetry I/O) are reported through [`Error`], which carries a
//! stable numeric code and a category for machine consumers:
//!
//! ```json
//! {
//!   "code": 21,
//!   "category": "model",
//!   "message": "value 8 does not fit in 3 bits",
//!   "recoverable": false
//! }
//! ```
//!
//! Broken invariants inside the model and planner (out-of-order updates,
//! reverts without a matching update) are programmer errors and panic instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for MC-AIXI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Experiment configuration errors.
    Config,
    /// Values that cannot be fed to the model.
    Model,
    /// Environment construction or protocol errors.
    Environment,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Environment => write!(f, "environment"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for MC-AIXI.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    // Model errors (20-29)
    #[error("value {value} does not fit in {bits} bits")]
    ValueOutOfRange { value: u64, bits: u32 },

    #[error("action {action} is not one of the {num_actions} legal actions")]
    InvalidAction { action: u64, num_actions: u64 },

    // Environment errors (30-39)
    #[error("environment error: {0}")]
    Environment(String),

    #[error("environment '{name}' needs {required} {what} bits but the agent has {configured}")]
    WidthMismatch {
        name: String,
        what: &'static str,
        required: u32,
        configured: u32,
    },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Model errors
    /// - 30-39: Environment errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::UnknownEnvironment(_) => 11,
            Error::ValueOutOfRange { .. } => 21,
            Error::InvalidAction { .. } => 22,
            Error::Environment(_) => 30,
            Error::WidthMismatch { .. } => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::UnknownEnvironment(_) => ErrorCategory::Config,
            Error::ValueOutOfRange { .. } | Error::InvalidAction { .. } => ErrorCategory::Model,
            Error::Environment(_) | Error::WidthMismatch { .. } => ErrorCategory::Environment,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Whether fixing inputs and rerunning can resolve the error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Error::ValueOutOfRange { .. } | Error::InvalidAction { .. } | Error::Environment(_)
        )
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Run 'aixi check' to validate the experiment configuration.",
            Error::UnknownEnvironment(_) => {
                "Use one of the environments listed by 'aixi config presets'."
            }
            Error::ValueOutOfRange { .. } | Error::InvalidAction { .. } => {
                "The environment produced a value outside the agent's bit widths; report as a bug."
            }
            Error::Environment(_) => "The environment failed; report as a bug.",
            Error::WidthMismatch { .. } => {
                "Remove the explicit bit widths from the agent section or widen them."
            }
            Error::Io(_) => "Check disk space and permissions of the telemetry path.",
            Error::Json(_) => "Telemetry record could not be serialized; report as a bug.",
        }
    }

    /// Structured representation for JSON output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code(),
            "category": self.category(),
            "message": self.to_string(),
            "recoverable": self.is_recoverable(),
            "remediation": self.remediation(),
        })
    }
}
