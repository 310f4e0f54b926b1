//! Exit codes for the aixi CLI.
//!
//! Exit codes communicate the outcome of a run without requiring output
//! parsing.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User errors (fix the arguments or the experiment file)
//! - 20-29: Internal errors (bugs, or the machine refused I/O)

use crate::config::ConfigError;
use crate::experiment::ExperimentError;

/// Exit codes for aixi operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success: the command completed
    Clean = 0,

    /// Invalid arguments
    ArgsError = 10,

    /// Experiment file missing, unparsable or invalid
    ConfigError = 11,

    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error (telemetry or output could not be written)
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Check if this exit code is a user error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&self.as_i32())
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        self.as_i32() >= 20
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

impl From<&ConfigError> for ExitCode {
    fn from(err: &ConfigError) -> Self {
        match err {
            ConfigError::IoError { .. } => ExitCode::IoError,
            _ => ExitCode::ConfigError,
        }
    }
}

impl From<&ExperimentError> for ExitCode {
    fn from(err: &ExperimentError) -> Self {
        match err {
            ExperimentError::Invalid(_) => ExitCode::ConfigError,
            _ if err.is_io() => ExitCode::IoError,
            ExperimentError::Common(e) if e.category() == aixi_common::ErrorCategory::Config => {
                ExitCode::ConfigError
            }
            _ => ExitCode::InternalError,
        }
    }
}
