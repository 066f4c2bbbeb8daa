//! Pieces shared by the benchmark and correctness reports.

use crate::error::{ErrorKind, PipelineError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A (backend, pattern) combination that could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFailure {
    pub backend: String,
    pub arg_count: usize,
    pub pattern_number: usize,
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl CaseFailure {
    pub fn new(backend: &str, arg_count: usize, pattern_number: usize, err: &PipelineError) -> Self {
        Self {
            backend: backend.to_string(),
            arg_count,
            pattern_number,
            kind: err.kind(),
            message: err.to_string(),
            stderr: err.stderr().map(str::to_string),
        }
    }
}

/// Directory holding the artifact for one (backend, pattern) combination.
pub fn case_dir(work_dir: &Path, backend: &str, arg_count: usize, pattern_number: usize) -> PathBuf {
    work_dir
        .join(backend)
        .join(arg_count.to_string())
        .join(pattern_number.to_string())
}

pub fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_millis()
}
