//! Domain layer for the capability dispatcher
//!
//! Pure logic, no I/O: configuration, admission control and envelope
//! validation.

mod config;
mod errors;
mod rate_limiter;
mod validation;

pub use config::*;
pub use errors::*;
pub use rate_limiter::*;
pub use validation::*;
