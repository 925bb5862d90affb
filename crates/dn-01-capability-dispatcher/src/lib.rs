//! # dn-01-capability-dispatcher
//!
//! Routes signed messages between one peer-to-peer transport and the local
//! capabilities registered on this node.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): configuration, rate limiting, envelope validation
//! - **Ports Layer** (`ports/`): transport, signer, receiver and metrics traits
//! - **Adapters** (`adapters/`): Ed25519 signer, in-memory transport, Prometheus metrics
//! - **Service Layer** (`service/`): the [`Dispatcher`] and its tasks
//!
//! Each capability registers one receiver per DON it serves, keyed by
//! `(capability_id, don_id)`. Inbound messages are admitted by the rate
//! limiter, validated, then queued on the matching receiver's bounded
//! channel. Nothing blocks the receive loop: a full channel drops the message.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dn_01_capability_dispatcher::{
//!     CapabilityDispatcher, Dispatcher, DispatcherConfig, DispatcherDependencies,
//! };
//!
//! let dispatcher = Dispatcher::new(DispatcherDependencies {
//!     transport,
//!     signer,
//!     metrics,
//!     config: DispatcherConfig::default(),
//! })?;
//! dispatcher.start()?;
//! dispatcher.set_receiver("ccip@1.0.0", don_id, receiver)?;
//! dispatcher.send(peer_id, body)?;
//! dispatcher.close().await;
//! ```
//!
//! ## Security
//!
//! - Every envelope is Ed25519-signed by its author
//! - Relayed messages (body sender differs from transport sender) are rejected
//! - Error responses are never answered with error responses
//! - Untrusted strings are sanitized before logging

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{Ed25519Signer, InMemoryNetwork, InMemoryPeer};
#[cfg(feature = "metrics")]
pub use adapters::PrometheusMetrics;
pub use domain::{
    sanitize_log_string, validate_message, DispatcherConfig, DispatcherError, InvalidMessage,
    RateLimiter, RateLimiterConfig, SignerError, TransportError, ValidationError,
};
pub use ports::{
    CapabilityDispatcher, DispatcherMetrics, DropReason, InboundMessage, MessageReceiver,
    MessageSigner, NoopMetrics, PeerTransport,
};
pub use service::{Dispatcher, DispatcherDependencies};
