//! Error types for the DON launcher.

use shared_types::{ConfigDigest, DonId, PluginType};
use std::fmt;

/// Failure reading configurations from the home chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReaderError {
    #[error("home chain read failed: {0}")]
    Read(String),
}

/// Failure reported by an oracle creator or instance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("failed to create oracle: {0}")]
    Create(String),

    #[error("failed to start oracle: {0}")]
    Start(String),

    #[error("failed to close oracle: {0}")]
    Close(String),
}

/// Launcher errors
#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    #[error("failed to get {plugin_type} configs for don {don_id}: {source}")]
    ReadConfigs {
        don_id: DonId,
        plugin_type: PluginType,
        #[source]
        source: ReaderError,
    },

    #[error("failed to create oracle for don {don_id}, digest {digest}: {source}")]
    CreateOracle {
        don_id: DonId,
        digest: ConfigDigest,
        #[source]
        source: OracleError,
    },

    #[error("failed to start oracle for don {don_id}, digest {digest}: {source}")]
    StartOracle {
        don_id: DonId,
        digest: ConfigDigest,
        #[source]
        source: OracleError,
    },

    #[error("failed to close oracle for don {don_id}, digest {digest}: {source}")]
    CloseOracle {
        don_id: DonId,
        digest: ConfigDigest,
        #[source]
        source: OracleError,
    },

    #[error("reconciliation failed for {} don(s): {}", .failures.len(), DisplayFailures(.failures))]
    ReconciliationFailed { failures: Vec<DonFailure> },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("launcher already started")]
    AlreadyStarted,

    #[error("launcher is closed")]
    Closed,

    #[error("launcher task failed: {0}")]
    TaskFailed(String),
}

impl LauncherError {
    /// DONs named by a `ReconciliationFailed` error, in report order.
    pub fn failed_dons(&self) -> Vec<DonId> {
        match self {
            LauncherError::ReconciliationFailed { failures } => {
                failures.iter().map(|f| f.don_id).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Everything that went wrong for one DON during a reconciliation pass.
#[derive(Debug)]
pub struct DonFailure {
    pub don_id: DonId,
    pub errors: Vec<LauncherError>,
}

impl fmt::Display for DonFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "don {}: [", self.don_id)?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        write!(f, "]")
    }
}

struct DisplayFailures<'a>(&'a [DonFailure]);

impl fmt::Display for DisplayFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}
