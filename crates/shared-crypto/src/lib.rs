//! # Shared Crypto
//!
//! Ed25519 primitives behind peer identities and envelope signatures.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | Envelope signing, peer identity |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use signatures::{verify_detached, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
