//! Domain layer for the DON launcher
//!
//! Pure logic: configuration, registry diffing and desired-configuration
//! computation.

mod config;
mod desired;
mod diff;
mod errors;

pub use config::*;
pub use desired::*;
pub use diff::*;
pub use errors::*;
