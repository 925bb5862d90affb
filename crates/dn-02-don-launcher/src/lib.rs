//! # dn-02-don-launcher
//!
//! Keeps the set of running oracle instances in line with the capabilities
//! registry.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): registry diffing, desired configurations, errors
//! - **Ports Layer** (`ports/`): home chain reader, oracle creator/instance, registry listener
//! - **Service Layer** (`service/`): the [`Reconciler`] and the [`Launcher`] loop
//!
//! ```text
//! registry sync ──launch()──→ [latest snapshot]
//!                                   │ every tick
//!                                   ↓
//!                    diff(applied snapshot, latest)
//!                                   │
//!                 removed ──→ added ──→ updated
//!                                   │
//!            HomeChainReader ──→ desired digests ──→ OracleCreator
//! ```
//!
//! One instance runs per distinct configuration digest per DON. During a
//! blue-green transition the active and candidate configurations run side by
//! side; when the candidate is promoted, only the retired digest is closed.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dn_02_don_launcher::{Launcher, LauncherConfig, LauncherDependencies, RegistryListener};
//!
//! let launcher = Launcher::new(LauncherDependencies {
//!     reader,
//!     creator,
//!     peer_id,
//!     config: LauncherConfig::default(),
//! })?;
//! launcher.start()?;
//! launcher.launch(registry)?;
//! launcher.close().await?;
//! ```

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    desired_configs, diff, should_run, DiffResult, DonFailure, LauncherConfig, LauncherError,
    OracleError, ReaderError,
};
pub use ports::{HomeChainReader, OracleCreator, OracleInstance, RegistryListener};
pub use service::{Launcher, LauncherDependencies, PluginRegistry, Reconciler};
