//! SIMD instruction selection for permutation kernels.

pub mod block;
pub mod error;
pub mod external;

pub use block::*;
pub use error::*;
pub use external::*;

use permforge_kernels::TargetFamily;
use permforge_patterns::Pattern;
use std::sync::Arc;

/// Produces the C statements implementing a pattern with SIMD instructions.
///
/// The fragment reads `in` and writes `out` (both `float *`) and is embedded
/// verbatim as the body of the kernel's `permute` function.
pub trait SearchTool: Send + Sync {
    fn name(&self) -> &str;

    fn search(&self, pattern: &Pattern, family: TargetFamily) -> Result<String, SearchError>;
}

pub type DynSearchTool = Arc<dyn SearchTool>;
