//! Joins config-derived and status-derived quorum values per chain

use std::collections::BTreeMap;

use super::types::{ChainId, GovernorLimit, QuorumResult};

/// Inner join of config quorum results with status quorum values
///
/// Chains missing from either side produce no record. The output holds one
/// record per chain, ascending by chain id.
pub fn join_config_status(
    config: &BTreeMap<ChainId, QuorumResult>,
    status: &BTreeMap<ChainId, Option<u64>>,
) -> Vec<QuorumResult> {
    config
        .iter()
        .filter_map(|(chain_id, result)| {
            status.get(chain_id).map(|available| QuorumResult {
                available_notional: *available,
                ..*result
            })
        })
        .collect()
}

/// Wire form of [`join_config_status`]
pub fn join_governor_limits(
    config: &BTreeMap<ChainId, QuorumResult>,
    status: &BTreeMap<ChainId, Option<u64>>,
) -> Vec<GovernorLimit> {
    join_config_status(config, status)
        .into_iter()
        .map(GovernorLimit::from)
        .collect()
}
