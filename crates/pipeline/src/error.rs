use std::path::PathBuf;

use illustrator_core::error::CoreError;
use illustrator_core::gateway::SynthesisError;

/// Errors that abort a whole orchestrator call.
///
/// Per-image synthesis failures in the scene and style orchestrators are
/// recorded on the outcome instead and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Invalid input (unknown attribute key, bad parameters, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The output directory or an image file could not be written.
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A synthesis call failed in an all-or-nothing batch.
    #[error(transparent)]
    Synthesis(SynthesisError),

    /// The requester went away; the batch was rolled back.
    #[error("Request cancelled")]
    Cancelled,
}

impl From<SynthesisError> for PipelineError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::Cancelled => Self::Cancelled,
            other => Self::Synthesis(other),
        }
    }
}

impl PipelineError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}
