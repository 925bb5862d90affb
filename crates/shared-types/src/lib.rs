//! # Shared Types Crate
//!
//! Domain entities and the wire envelope shared by every DON node crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: registry and OCR3 types are defined once here
//!   and consumed by both the dispatcher and the launcher.
//! - **Envelope Integrity**: `Message` is the only thing that crosses the
//!   transport; its body is signed by the sender's peer key.

pub mod entities;
pub mod envelope;
pub mod errors;

pub use entities::*;
pub use envelope::{ErrorCode, Message, MessageBody};
pub use errors::*;
