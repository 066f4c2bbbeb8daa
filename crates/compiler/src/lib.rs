//! PermForge compiler facade: generation engine, session and harnesses.

pub mod bench;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod correctness;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod session;
#[cfg(test)]
mod testing;

pub use bench::*;
#[cfg(feature = "cli")]
pub use cli::*;
pub use config::*;
pub use correctness::*;
pub use error::*;
pub use pipeline::*;
pub use report::*;
pub use session::*;
