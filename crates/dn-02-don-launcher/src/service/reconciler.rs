//! Reconciliation engine.
//!
//! ## Phases
//!
//! `process_diff` applies a [`DiffResult`] in three ordered phases:
//!
//! 1. **Removed**: close every instance of the DON, forget the DON.
//! 2. **Added**: start an instance for every desired digest.
//! 3. **Updated**: start desired-but-missing digests, then close running
//!    digests that are no longer desired. Digests in both sets are untouched.
//!
//! Added and updated DONs go through the same digest-set reconciliation
//! against whatever is already running, so a retry after a partial failure
//! only creates what is still missing.
//!
//! ## Concurrency
//!
//! DONs within one phase are reconciled concurrently. Each DON's
//! [`PluginRegistry`] is moved out of the map for the duration of its work
//! and committed back afterwards, so no lock is held across `create`,
//! `start` or `close`. Work inside one DON is sequential.
//!
//! ## Failures
//!
//! A failing DON never blocks the others. Instances that did start are kept;
//! the DON's snapshot entry is not advanced, so the next diff retries it.

use crate::domain::{
    desired_configs, diff, should_run, DiffResult, DonFailure, LauncherError,
};
use crate::ports::{HomeChainReader, OracleCreator, OracleInstance};
use crate::service::plugin_registry::PluginRegistry;
use futures::future::join_all;
use shared_types::{ConfigDigest, Don, DonId, LocalRegistry, Ocr3ConfigWithMeta, PeerId, PluginType};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies registry diffs to the set of running oracle instances.
pub struct Reconciler {
    ctx: ReconcileContext,
    /// Last successfully applied definition of each DON
    reg_state: LocalRegistry,
    instances: HashMap<DonId, PluginRegistry>,
}

/// What a DON's reconciliation needs, shared read-only across DONs.
struct ReconcileContext {
    reader: Arc<dyn HomeChainReader>,
    creator: Arc<dyn OracleCreator>,
    peer_id: PeerId,
}

struct DonOutcome {
    don: Don,
    registry: PluginRegistry,
    errors: Vec<LauncherError>,
}

impl Reconciler {
    pub fn new(
        peer_id: PeerId,
        reader: Arc<dyn HomeChainReader>,
        creator: Arc<dyn OracleCreator>,
    ) -> Self {
        Self {
            ctx: ReconcileContext {
                reader,
                creator,
                peer_id,
            },
            reg_state: LocalRegistry::default(),
            instances: HashMap::new(),
        }
    }

    /// The last applied registry snapshot.
    pub fn reg_state(&self) -> &LocalRegistry {
        &self.reg_state
    }

    /// Number of running instances for `don_id`.
    pub fn instance_count(&self, don_id: DonId) -> usize {
        self.instances.get(&don_id).map_or(0, PluginRegistry::len)
    }

    /// Digests with a running instance for `don_id`.
    pub fn running_digests(&self, don_id: DonId) -> BTreeSet<ConfigDigest> {
        self.instances
            .get(&don_id)
            .map(PluginRegistry::digests)
            .unwrap_or_default()
    }

    /// Number of running instances across all DONs.
    pub fn total_instances(&self) -> usize {
        self.instances.values().map(PluginRegistry::len).sum()
    }

    /// Diff `latest` against the applied snapshot.
    ///
    /// Also schedules removal of instances belonging to DONs that never
    /// made it into the snapshot (their addition failed) and are no longer
    /// wanted.
    pub fn pending_diff(&self, capability_id: &str, latest: &LocalRegistry) -> DiffResult {
        let mut result = diff(capability_id, &self.reg_state, latest);
        let wanted = latest.dons_with_capability(capability_id);

        for id in self.instances.keys() {
            if !self.reg_state.ids_to_dons.contains_key(id) && !wanted.contains_key(id) {
                result.removed.entry(*id).or_insert_with(|| Don {
                    id: *id,
                    ..Default::default()
                });
            }
        }
        result
    }

    /// Apply `diff`: removed, then added, then updated.
    ///
    /// # Errors
    /// `ReconciliationFailed` naming every DON that could not be fully
    /// reconciled. All other DONs are reconciled regardless.
    pub async fn process_diff(&mut self, diff: DiffResult) -> Result<(), LauncherError> {
        let DiffResult {
            added,
            removed,
            updated,
        } = diff;
        let mut failures = self.remove_dons(removed.into_keys()).await;
        failures.extend(self.reconcile_dons(added).await);
        failures.extend(self.reconcile_dons(updated).await);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LauncherError::ReconciliationFailed { failures })
        }
    }

    /// Close every running instance and forget all state.
    pub async fn close_all(&mut self) -> Result<(), LauncherError> {
        let ids: Vec<DonId> = self.instances.keys().copied().collect();
        let failures = self.remove_dons(ids.into_iter()).await;
        self.reg_state = LocalRegistry::default();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LauncherError::ReconciliationFailed { failures })
        }
    }

    async fn remove_dons(&mut self, ids: impl Iterator<Item = DonId>) -> Vec<DonFailure> {
        let jobs: Vec<(DonId, PluginRegistry)> = ids
            .map(|id| (id, self.instances.remove(&id).unwrap_or_default()))
            .collect();

        let closed = join_all(
            jobs.into_iter()
                .map(|(id, registry)| async move { (id, close_registry(id, registry).await) }),
        )
        .await;

        let mut failures = Vec::new();
        for (id, errors) in closed {
            self.reg_state.ids_to_dons.remove(&id);
            info!(don_id = id, "Removed DON");
            if !errors.is_empty() {
                failures.push(DonFailure { don_id: id, errors });
            }
        }
        failures
    }

    async fn reconcile_dons(&mut self, dons: BTreeMap<DonId, Don>) -> Vec<DonFailure> {
        let jobs: Vec<(Don, PluginRegistry)> = dons
            .into_values()
            .map(|don| {
                let registry = self.instances.remove(&don.id).unwrap_or_default();
                (don, registry)
            })
            .collect();

        let ctx = &self.ctx;
        let outcomes = join_all(
            jobs.into_iter()
                .map(|(don, registry)| ctx.reconcile_don(don, registry)),
        )
        .await;

        let mut failures = Vec::new();
        for DonOutcome {
            don,
            registry,
            errors,
        } in outcomes
        {
            let id = don.id;
            if !registry.is_empty() {
                self.instances.insert(id, registry);
            }
            if errors.is_empty() {
                self.reg_state.ids_to_dons.insert(id, don);
            } else {
                warn!(don_id = id, errors = errors.len(), "DON reconciliation failed");
                failures.push(DonFailure { don_id: id, errors });
            }
        }
        failures
    }
}

impl ReconcileContext {
    /// Bring `registry` in line with the configurations `don` requires.
    async fn reconcile_don(&self, don: Don, mut registry: PluginRegistry) -> DonOutcome {
        let desired = match self.desired_for(&don).await {
            Ok(desired) => desired,
            Err(e) => {
                return DonOutcome {
                    don,
                    registry,
                    errors: vec![e],
                }
            }
        };
        let wanted: BTreeSet<ConfigDigest> = desired.iter().map(|c| c.config_digest).collect();
        let mut errors = Vec::new();

        // Create new before closing stale.
        for config in &desired {
            if registry.contains(&config.config_digest) {
                continue;
            }
            match self.launch_instance(&don, config).await {
                Ok(instance) => {
                    registry.insert(config.config_digest, instance);
                }
                Err(e) => errors.push(e),
            }
        }

        // Keep stale instances running until every replacement is up.
        if errors.is_empty() {
            let stale: Vec<ConfigDigest> = registry.digests().difference(&wanted).copied().collect();
            for digest in stale {
                let Some(instance) = registry.remove(&digest) else {
                    continue;
                };
                match instance.close().await {
                    Ok(()) => info!(don_id = don.id, digest = %digest, "Closed oracle instance"),
                    Err(source) => errors.push(LauncherError::CloseOracle {
                        don_id: don.id,
                        digest,
                        source,
                    }),
                }
            }
        }

        DonOutcome {
            don,
            registry,
            errors,
        }
    }

    async fn desired_for(&self, don: &Don) -> Result<Vec<Ocr3ConfigWithMeta>, LauncherError> {
        if !should_run(don, &self.peer_id, self.creator.oracle_type()) {
            debug!(
                don_id = don.id,
                "Not a member of this DON and not a bootstrap node, skipping"
            );
            return Ok(Vec::new());
        }

        let mut pairs = Vec::with_capacity(PluginType::ALL.len());
        for plugin_type in PluginType::ALL {
            let pair = self
                .reader
                .get_ocr_configs(don.id, plugin_type)
                .await
                .map_err(|source| LauncherError::ReadConfigs {
                    don_id: don.id,
                    plugin_type,
                    source,
                })?;
            pairs.push(pair);
        }
        Ok(desired_configs(pairs))
    }

    async fn launch_instance(
        &self,
        don: &Don,
        config: &Ocr3ConfigWithMeta,
    ) -> Result<Box<dyn OracleInstance>, LauncherError> {
        let digest = config.config_digest;
        let instance = self
            .creator
            .create(don, config)
            .await
            .map_err(|source| LauncherError::CreateOracle {
                don_id: don.id,
                digest,
                source,
            })?;

        if let Err(source) = instance.start().await {
            if let Err(e) = instance.close().await {
                warn!(don_id = don.id, digest = %digest, error = %e, "Failed to close oracle that did not start");
            }
            return Err(LauncherError::StartOracle {
                don_id: don.id,
                digest,
                source,
            });
        }

        info!(
            don_id = don.id,
            digest = %digest,
            plugin_type = %config.config.plugin_type,
            "Started oracle instance"
        );
        Ok(instance)
    }
}

async fn close_registry(don_id: DonId, mut registry: PluginRegistry) -> Vec<LauncherError> {
    let mut errors = Vec::new();
    for (digest, instance) in registry.drain() {
        match instance.close().await {
            Ok(()) => debug!(don_id, digest = %digest, "Closed oracle instance"),
            Err(source) => errors.push(LauncherError::CloseOracle {
                don_id,
                digest,
                source,
            }),
        }
    }
    errors
}
