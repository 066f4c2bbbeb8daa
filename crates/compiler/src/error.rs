//! Pipeline errors and their classification.

use permforge_kernels::BackendError;
use permforge_patterns::PatternError;
use permforge_runtime::{BuildError, ExecutionError};
use permforge_search::SearchError;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Stage at which an artifact failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rejected before any process was spawned.
    Configuration,
    Generation,
    Build,
    Execution,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    #[error("cannot write generated source {path}: {source}")]
    WriteSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Pattern(_) => ErrorKind::Configuration,
            PipelineError::Backend(BackendError::NotFound { .. }) => ErrorKind::Configuration,
            PipelineError::Backend(BackendError::MissingFragment { .. }) => ErrorKind::Generation,
            PipelineError::Search(_) | PipelineError::WriteSource { .. } => ErrorKind::Generation,
            PipelineError::Build(_) => ErrorKind::Build,
            PipelineError::Execution(_) => ErrorKind::Execution,
        }
    }

    /// Diagnostic output of the failing process, when one ran.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            PipelineError::Search(SearchError::Failed { stderr, .. }) => Some(stderr),
            PipelineError::Build(err) => err.stderr(),
            PipelineError::Execution(err) => err.stderr(),
            _ => None,
        }
    }
}
