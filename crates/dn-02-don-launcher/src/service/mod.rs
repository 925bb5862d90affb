//! Launcher Service
//!
//! Holds the latest registry snapshot handed in through [`RegistryListener`]
//! and, on every tick, applies its diff against the last applied snapshot.
//!
//! The [`Reconciler`] is owned by the monitor task while the launcher runs,
//! so reconciliation passes never overlap. `close()` stops the task, takes
//! the reconciler back and closes every instance.

mod plugin_registry;
mod reconciler;


pub use plugin_registry::PluginRegistry;
pub use reconciler::Reconciler;

use crate::domain::{LauncherConfig, LauncherError};
use crate::ports::{HomeChainReader, OracleCreator, RegistryListener};
use parking_lot::Mutex;
use shared_types::{LocalRegistry, PeerId};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Dependencies for Launcher
pub struct LauncherDependencies {
    pub reader: Arc<dyn HomeChainReader>,
    pub creator: Arc<dyn OracleCreator>,
    /// This node's P2P identity, checked against DON membership
    pub peer_id: PeerId,
    pub config: LauncherConfig,
}

enum State {
    Idle(Reconciler),
    Running(JoinHandle<Reconciler>),
    Closed,
}

/// Starts, updates and stops oracle instances as the registry changes.
pub struct Launcher {
    config: LauncherConfig,
    latest: Arc<Mutex<Option<LocalRegistry>>>,
    state: Mutex<State>,
    cancel: CancellationToken,
}

impl Launcher {
    /// # Errors
    /// `InvalidConfig` for a zero tick interval or empty capability ID.
    pub fn new(deps: LauncherDependencies) -> Result<Self, LauncherError> {
        if deps.config.tick_interval.is_zero() {
            return Err(LauncherError::InvalidConfig(
                "tick interval must be positive".to_string(),
            ));
        }
        if deps.config.capability_id.is_empty() {
            return Err(LauncherError::InvalidConfig(
                "capability id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            config: deps.config,
            latest: Arc::new(Mutex::new(None)),
            state: Mutex::new(State::Idle(Reconciler::new(
                deps.peer_id,
                deps.reader,
                deps.creator,
            ))),
            cancel: CancellationToken::new(),
        })
    }

    /// Spawn the monitor task.
    ///
    /// # Errors
    /// - `AlreadyStarted` if the task is running
    /// - `Closed` after shutdown
    pub fn start(&self) -> Result<(), LauncherError> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, State::Closed) {
            State::Idle(reconciler) => {
                let handle = tokio::spawn(monitor(
                    reconciler,
                    Arc::clone(&self.latest),
                    self.config.capability_id.clone(),
                    self.config.tick_interval,
                    self.cancel.clone(),
                ));
                *state = State::Running(handle);
                info!(
                    capability_id = %self.config.capability_id,
                    tick_ms = self.config.tick_interval.as_millis() as u64,
                    "DON launcher started"
                );
                Ok(())
            }
            running @ State::Running(_) => {
                *state = running;
                Err(LauncherError::AlreadyStarted)
            }
            State::Closed => Err(LauncherError::Closed),
        }
    }

    /// Stop the monitor task and close every running instance.
    ///
    /// A second call is a no-op.
    pub async fn close(&self) -> Result<(), LauncherError> {
        self.cancel.cancel();
        let state = std::mem::replace(&mut *self.state.lock(), State::Closed);

        let mut reconciler = match state {
            State::Idle(reconciler) => reconciler,
            State::Running(handle) => handle
                .await
                .map_err(|e| LauncherError::TaskFailed(e.to_string()))?,
            State::Closed => return Ok(()),
        };

        let running = reconciler.total_instances();
        let result = reconciler.close_all().await;
        info!(instances = running, "DON launcher closed");
        result
    }
}

impl RegistryListener for Launcher {
    fn launch(&self, registry: LocalRegistry) -> Result<(), LauncherError> {
        if self.cancel.is_cancelled() {
            return Err(LauncherError::Closed);
        }
        *self.latest.lock() = Some(registry);
        Ok(())
    }
}

async fn monitor(
    mut reconciler: Reconciler,
    latest: Arc<Mutex<Option<LocalRegistry>>>,
    capability_id: String,
    tick_interval: Duration,
    cancel: CancellationToken,
) -> Reconciler {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let snapshot = latest.lock().clone();
                let Some(snapshot) = snapshot else {
                    continue;
                };
                let diff = reconciler.pending_diff(&capability_id, &snapshot);
                if diff.is_empty() {
                    continue;
                }

                info!(
                    added = diff.added.len(),
                    updated = diff.updated.len(),
                    removed = diff.removed.len(),
                    "Processing registry diff"
                );
                if let Err(e) = reconciler.process_diff(diff).await {
                    error!(error = %e, failed_dons = ?e.failed_dons(), "Failed to process registry diff");
                }
            }
        }
    }
    reconciler
}
