use std::path::PathBuf;

use thiserror::Error;

use crate::browser::session::SessionError;
use crate::oracle::error::OracleError;

/// Why a pipeline stage stopped.
///
/// Every variant is fatal to the stage that raised it. The orchestrator turns
/// it into a failed stage for the current subject and moves on.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Structural checks failed: nothing usable extracted, no steps parsed, ...
    #[error("Validation failed ({stage}): {reason}")]
    Validation { stage: &'static str, reason: String },

    #[error("Failed to persist {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {context}: {source}")]
    Serialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Test execution failed to start: {0}")]
    Execution(String),
}

impl PipelineError {
    pub fn validation(stage: &'static str, reason: impl Into<String>) -> Self {
        PipelineError::Validation {
            stage,
            reason: reason.into(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Short category label used in run logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Oracle(_) => "oracle",
            PipelineError::Validation { .. } => "validation",
            PipelineError::Persistence { .. } | PipelineError::Serialize { .. } => "persistence",
            PipelineError::Read { .. } => "input",
            PipelineError::Session(_) => "session",
            PipelineError::Execution(_) => "execution",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
