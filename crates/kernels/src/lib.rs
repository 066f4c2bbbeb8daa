//! Kernel backends for PermForge: each one renders a permutation pattern into
//! a self-contained program speaking the kernel wire protocol.

pub mod backend;
pub mod config;
pub mod error;
pub mod gpu;
pub mod registry;
pub mod scalar;
pub mod simd;
pub mod utils;

pub use backend::*;
pub use config::*;
pub use error::*;
pub use gpu::*;
pub use registry::*;
pub use scalar::*;
pub use simd::*;
