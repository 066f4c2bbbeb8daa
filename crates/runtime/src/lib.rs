//! Process plumbing for PermForge: compiling generated sources and running the
//! resulting kernels over their JSON protocol.

pub mod builder;
pub mod error;
pub mod executor;
pub mod process;
pub mod protocol;

pub use builder::*;
pub use error::*;
pub use executor::*;
pub use process::*;
pub use protocol::*;
