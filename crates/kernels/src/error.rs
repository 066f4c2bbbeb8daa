//! Backend lookup and rendering errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("unknown backend `{name}` (available: {available})")]
    NotFound { name: String, available: String },

    #[error("backend `{backend}` requires a SIMD permutation fragment")]
    MissingFragment { backend: String },
}
