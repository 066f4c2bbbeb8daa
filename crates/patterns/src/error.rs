//! Errors raised while building or generating patterns.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("destination index {index} out of range for {arg_count} elements")]
    OutOfRange { index: usize, arg_count: usize },

    #[error("destination index {index} is used more than once")]
    Duplicate { index: usize },

    #[error("probe sequence has {found} values but the pattern has {expected}")]
    ProbeLength { expected: usize, found: usize },

    #[error("input has {found} values but the pattern has {expected}")]
    InputLength { expected: usize, found: usize },

    #[error("invalid integer `{token}` in pattern encoding")]
    Parse { token: String },

    #[error("run of {run} values exceeds the remaining pool of {remaining}")]
    RunExceedsPool { run: usize, remaining: usize },
}
