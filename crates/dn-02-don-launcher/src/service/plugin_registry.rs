//! Running instances of one DON, keyed by configuration digest.

use crate::ports::OracleInstance;
use shared_types::ConfigDigest;
use std::collections::{BTreeMap, BTreeSet};

/// At most one running instance per digest.
#[derive(Default)]
pub struct PluginRegistry {
    instances: BTreeMap<ConfigDigest, Box<dyn OracleInstance>>,
}

impl PluginRegistry {
    pub fn contains(&self, digest: &ConfigDigest) -> bool {
        self.instances.contains_key(digest)
    }

    /// Track a started instance. Returns the previous one for `digest`, if any.
    pub fn insert(
        &mut self,
        digest: ConfigDigest,
        instance: Box<dyn OracleInstance>,
    ) -> Option<Box<dyn OracleInstance>> {
        self.instances.insert(digest, instance)
    }

    pub fn remove(&mut self, digest: &ConfigDigest) -> Option<Box<dyn OracleInstance>> {
        self.instances.remove(digest)
    }

    pub fn digests(&self) -> BTreeSet<ConfigDigest> {
        self.instances.keys().copied().collect()
    }

    /// Take every instance out of the registry.
    pub fn drain(&mut self) -> Vec<(ConfigDigest, Box<dyn OracleInstance>)> {
        std::mem::take(&mut self.instances).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
