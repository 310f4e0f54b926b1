use aixi_config::ValidationError;
use thiserror::Error;

/// Failures that stop an experiment run.
#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error("invalid experiment: {0}")]
    Invalid(#[from] ValidationError),

    #[error("cycle {global_cycle}: {source}")]
    Cycle {
        global_cycle: u64,
        #[source]
        source: aixi_common::Error,
    },

    #[error(transparent)]
    Common(#[from] aixi_common::Error),
}

impl ExperimentError {
    /// Stable code of the underlying error.
    pub fn code(&self) -> u32 {
        match self {
            ExperimentError::Invalid(e) => e.code(),
            ExperimentError::Cycle { source, .. } => source.code(),
            ExperimentError::Common(e) => e.code(),
        }
    }

    /// Whether this came from reading or writing files.
    pub fn is_io(&self) -> bool {
        let inner = match self {
            ExperimentError::Invalid(_) => return false,
            ExperimentError::Cycle { source, .. } => source,
            ExperimentError::Common(e) => e,
        };
        inner.category() == aixi_common::ErrorCategory::Io
    }
}
