//! Registry diffing.

use shared_types::{Don, DonId, LocalRegistry};
use std::collections::BTreeMap;

/// DONs that changed between two registry snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub added: BTreeMap<DonId, Don>,
    pub removed: BTreeMap<DonId, Don>,
    pub updated: BTreeMap<DonId, Don>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Compare two snapshots, considering only DONs that carry `capability_id`.
///
/// - `added`: in `new` but not `old`
/// - `removed`: in `old` but not `new`
/// - `updated`: in both but not equal; carries the `new` definition
pub fn diff(capability_id: &str, old: &LocalRegistry, new: &LocalRegistry) -> DiffResult {
    let old = old.dons_with_capability(capability_id);
    let new = new.dons_with_capability(capability_id);
    let mut result = DiffResult::default();

    for (id, don) in &new {
        match old.get(id) {
            None => {
                result.added.insert(*id, don.clone());
            }
            Some(previous) if previous != don => {
                result.updated.insert(*id, don.clone());
            }
            Some(_) => {}
        }
    }
    for (id, don) in old {
        if !new.contains_key(&id) {
            result.removed.insert(id, don);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: &str = "ccip@1.0.0";

    fn don(id: DonId, with_capability: bool) -> Don {
        let mut don = Don {
            id,
            f: 1,
            ..Default::default()
        };
        if with_capability {
            don.capability_configurations
                .insert(CAP.to_string(), vec![]);
        }
        don
    }

    #[test]
    fn test_classifies_changes() {
        let mut changed = don(2, true);
        changed.config_version = 2;

        let old = LocalRegistry::from_dons([don(1, true), don(2, true), don(3, true)]);
        let new = LocalRegistry::from_dons([changed.clone(), don(3, true), don(4, true)]);

        let result = diff(CAP, &old, &new);
        assert_eq!(result.added.keys().copied().collect::<Vec<_>>(), vec![4]);
        assert_eq!(result.removed.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(result.updated.get(&2), Some(&changed));
        assert_eq!(result.updated.len(), 1);
    }

    #[test]
    fn test_ignores_dons_without_capability() {
        let old = LocalRegistry::from_dons([don(1, false)]);
        let new = LocalRegistry::from_dons([don(2, false)]);
        assert!(diff(CAP, &old, &new).is_empty());
    }

    #[test]
    fn test_losing_capability_counts_as_removal() {
        let old = LocalRegistry::from_dons([don(1, true)]);
        let new = LocalRegistry::from_dons([don(1, false)]);

        let result = diff(CAP, &old, &new);
        assert_eq!(result.removed.len(), 1);
        assert!(result.updated.is_empty());
    }

    #[test]
    fn test_identical_snapshots() {
        let registry = LocalRegistry::from_dons([don(1, true), don(2, true)]);
        assert!(diff(CAP, &registry, &registry.clone()).is_empty());
    }
}
