//! Runtime errors for spawning tools, building kernels and executing them.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed while waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` did not finish within {timeout_ms} ms and was killed")]
    TimedOut { program: String, timeout_ms: u128 },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("backend `{backend}` has an empty compiler invocation")]
    EmptyInvocation { backend: String },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("compiler exited with {}: {stderr}", exit_label(*.exit_code))]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("cannot prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("kernel reported error (code {code}): {message}")]
    Kernel {
        message: String,
        code: i32,
        stderr: String,
    },

    #[error("kernel exited with {}: {stderr}", exit_label(*.exit_code))]
    Exit {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("undecodable kernel output `{stdout}`: {reason}")]
    Decode {
        reason: String,
        stdout: String,
        stderr: String,
    },

    #[error("kernel returned {found} values for {expected} inputs")]
    LengthMismatch { expected: usize, found: usize },
}

impl BuildError {
    pub fn stderr(&self) -> Option<&str> {
        match self {
            BuildError::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

impl ExecutionError {
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ExecutionError::Kernel { stderr, .. }
            | ExecutionError::Exit { stderr, .. }
            | ExecutionError::Decode { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}
