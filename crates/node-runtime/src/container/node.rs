//! # Oracle Node
//!
//! Composition root: one dispatcher and one launcher sharing a peer identity
//! and a metrics registry.
//!
//! ## Lifecycle
//!
//! 1. `new()` validates the configuration and wires the services
//! 2. `start()` starts the dispatcher, then the launcher
//! 3. `shutdown()` closes the launcher first, so oracle instances can
//!    unregister their receivers while the dispatcher is still up

use super::config::NodeConfig;
use anyhow::{ensure, Context, Result};
use dn_01_capability_dispatcher::{
    CapabilityDispatcher, Dispatcher, DispatcherDependencies, Ed25519Signer, PeerTransport,
    PrometheusMetrics,
};
use dn_02_don_launcher::{
    HomeChainReader, Launcher, LauncherDependencies, OracleCreator, RegistryListener,
};
use don_telemetry::MetricsHandle;
use shared_types::{LocalRegistry, PeerId};
use std::sync::Arc;
use tracing::{info, warn};

/// Services supplied by the embedding process.
pub struct NodeDependencies<T> {
    pub transport: Arc<T>,
    pub reader: Arc<dyn HomeChainReader>,
    /// Registry the dispatcher's metrics are registered on.
    pub metrics: MetricsHandle,
}

/// A running DON node.
pub struct OracleNode<T: PeerTransport> {
    dispatcher: Dispatcher<T, Ed25519Signer>,
    launcher: Launcher,
    metrics: MetricsHandle,
}

impl<T: PeerTransport> OracleNode<T> {
    /// Wire the node.
    ///
    /// `make_creator` receives the node's dispatcher so oracle instances can
    /// register receivers on it.
    pub fn new<F>(config: NodeConfig, deps: NodeDependencies<T>, make_creator: F) -> Result<Self>
    where
        F: FnOnce(Arc<dyn CapabilityDispatcher>) -> Arc<dyn OracleCreator>,
    {
        config
            .validate_for_production()
            .context("invalid node configuration")?;

        let signer = Ed25519Signer::new(config.security.keypair()?);
        let peer_id = signer.peer_id();
        ensure!(
            peer_id == deps.transport.id(),
            "transport identity {} does not match the P2P key {}",
            deps.transport.id(),
            peer_id
        );

        let metrics = PrometheusMetrics::new(deps.metrics.registry())
            .context("failed to register dispatcher metrics")?;

        let dispatcher = Dispatcher::new(DispatcherDependencies {
            transport: deps.transport,
            signer: Arc::new(signer),
            metrics: Arc::new(metrics),
            config: config.dispatcher,
        })
        .context("failed to create capability dispatcher")?;

        let creator = make_creator(Arc::new(dispatcher.clone()));
        let launcher = Launcher::new(LauncherDependencies {
            reader: deps.reader,
            creator,
            peer_id,
            config: config.launcher,
        })
        .context("failed to create DON launcher")?;

        Ok(Self {
            dispatcher,
            launcher,
            metrics: deps.metrics,
        })
    }

    pub fn peer_id(&self) -> PeerId {
        self.dispatcher.peer_id()
    }

    pub fn dispatcher(&self) -> &Dispatcher<T, Ed25519Signer> {
        &self.dispatcher
    }

    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    /// Start the dispatcher, then the launcher.
    pub fn start(&self) -> Result<()> {
        self.dispatcher
            .start()
            .context("failed to start capability dispatcher")?;
        self.launcher
            .start()
            .context("failed to start DON launcher")?;
        info!(peer_id = %self.peer_id(), "Oracle node started");
        Ok(())
    }

    /// Hand a fresh registry snapshot to the launcher.
    pub fn on_registry_update(&self, registry: LocalRegistry) -> Result<()> {
        self.launcher
            .launch(registry)
            .context("launcher rejected registry snapshot")
    }

    /// Close the launcher, then the dispatcher.
    ///
    /// The dispatcher is closed even if the launcher reports errors; those
    /// are returned afterwards.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down oracle node");
        let launcher = self.launcher.close().await;
        if let Err(e) = &launcher {
            warn!(error = %e, "DON launcher closed with errors");
        }
        self.dispatcher.close().await;
        launcher.context("failed to close DON launcher")?;
        info!("Oracle node stopped");
        Ok(())
    }
}
