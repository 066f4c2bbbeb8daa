//! Permutation patterns for PermForge kernels.

pub mod catalog;
pub mod error;
pub mod generator;
pub mod pattern;

pub use catalog::*;
pub use error::*;
pub use generator::*;
pub use pattern::*;
