use permforge_patterns::PatternError;
use permforge_runtime::ProcessError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("search tool exited with status {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("search tool printed no code for pattern `{pattern}`")]
    EmptyFragment { pattern: String },

    #[error("search tool returned an invalid random pattern `{output}`: {source}")]
    RandomPattern {
        output: String,
        #[source]
        source: PatternError,
    },

    #[error("search tool returned {found} elements, expected {expected}")]
    RandomLength { expected: usize, found: usize },
}
