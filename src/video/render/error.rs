use std::path::PathBuf;

use thiserror::Error;

use super::fit::FitError;

/// Every way a render run can abort. Encoder probing is deliberately absent:
/// it always degrades to the software encoder instead of failing.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Segment {index}: {reason}")]
    Resolution { index: usize, reason: String },

    #[error("Segment {index}: unknown fit policy `{value}`")]
    UnknownPolicy { index: usize, value: String },

    #[error("Failed to probe duration of {subject} ({}): {reason}", path.display())]
    Probe {
        subject: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Segment {index}: {source}")]
    Fitting {
        index: usize,
        #[source]
        source: FitError,
    },

    #[error("Segment {index}: encode failed: {diagnostics}")]
    Encode { index: usize, diagnostics: String },

    #[error("Intermediate for segment {index} is missing at {}", path.display())]
    MissingIntermediate { index: usize, path: PathBuf },

    #[error("Composition failed: {diagnostics}")]
    Compose { diagnostics: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RenderError::InvalidInput(message.into())
    }

    /// Segment the error belongs to, when there is one.
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            RenderError::Resolution { index, .. }
            | RenderError::UnknownPolicy { index, .. }
            | RenderError::Fitting { index, .. }
            | RenderError::Encode { index, .. }
            | RenderError::MissingIntermediate { index, .. } => Some(*index),
            _ => None,
        }
    }
}
