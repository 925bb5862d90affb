//! # Error Types
//!
//! Errors raised while parsing or (de)serializing shared types.

use thiserror::Error;

/// Errors related to shared type conversions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Input was not valid hex.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Byte length did not match the expected fixed size.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Serialization failed.
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// Deserialization failed.
    #[error("Decoding failed: {0}")]
    Decoding(String),
}
