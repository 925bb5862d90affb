//! Cross-crate integration flows.

pub mod fixtures;
pub mod launcher_flow;
pub mod messaging;
