//! Driving ports (Inbound API)

use crate::domain::LauncherError;
use shared_types::LocalRegistry;

/// Receives registry snapshots from the registry sync source.
pub trait RegistryListener: Send + Sync {
    /// Record `registry` as the latest known state.
    ///
    /// Does not reconcile; the launcher applies the snapshot on its next tick.
    ///
    /// # Errors
    /// `Closed` after shutdown.
    fn launch(&self, registry: LocalRegistry) -> Result<(), LauncherError>;
}
