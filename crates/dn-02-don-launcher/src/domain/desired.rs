//! Desired-configuration computation.
//!
//! For each plugin type a DON may have an active and a candidate
//! configuration. Every configuration with a non-empty digest needs one
//! running instance; configurations sharing a digest share the instance.

use shared_types::{ActiveAndCandidate, ConfigDigest, Don, Ocr3ConfigWithMeta, OracleType, PeerId};
use std::collections::HashSet;

/// Whether this node runs instances for `don` at all.
///
/// Plugin nodes only serve DONs they are members of; bootstrap nodes serve
/// every DON.
pub fn should_run(don: &Don, own_id: &PeerId, oracle_type: OracleType) -> bool {
    oracle_type == OracleType::Bootstrap || don.is_member(own_id)
}

/// Configurations needing an instance, unique by digest.
///
/// Order follows the input, active before candidate, so the first
/// configuration seen for a digest wins.
pub fn desired_configs(
    pairs: impl IntoIterator<Item = ActiveAndCandidate>,
) -> Vec<Ocr3ConfigWithMeta> {
    let mut seen: HashSet<ConfigDigest> = HashSet::new();
    let mut desired = Vec::new();

    for pair in pairs {
        for config in [pair.active, pair.candidate] {
            if config.is_set() && seen.insert(config.config_digest) {
                desired.push(config);
            }
        }
    }
    desired
}
