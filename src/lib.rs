//! PermForge: generate, build, run and benchmark permutation kernels.

pub use permforge_compiler as compiler;
pub use permforge_kernels as kernels;
pub use permforge_patterns as patterns;
pub use permforge_runtime as runtime;
pub use permforge_search as search;
