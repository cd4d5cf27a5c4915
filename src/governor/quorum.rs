//! Quorum order-statistic selection
//!
//! The value the network enforces for a metric is the k-th largest value
//! reported: the most conservative value that at least `k` guardians still
//! honour.

use std::collections::BTreeMap;

use tracing::debug;

use super::extractor::SampleSet;
use super::types::{ChainId, Metric, QuorumResult};

/// Select the k-th largest value, or `None` when fewer than `k` values exist
pub fn select_quorum(values: &[u64], k: usize) -> Option<u64> {
    if k == 0 || values.len() < k {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    Some(sorted[k - 1])
}

/// Quorum value of one metric for one chain
pub fn quorum_for(samples: &SampleSet, chain_id: ChainId, metric: Metric, k: usize) -> Option<u64> {
    let values = samples.values(chain_id, metric);
    let selected = select_quorum(&values, k);

    if selected.is_none() {
        debug!(
            "Quorum not reached for {} on chain {}: {} of {} guardians reported",
            metric,
            chain_id,
            values.len(),
            k
        );

        #[cfg(feature = "metrics")]
        crate::metrics::record_quorum_unreached(metric.as_str());
    }

    selected
}

/// Quorum-derived config metrics for every chain present in config samples
pub fn config_quorum(samples: &SampleSet, k: usize) -> BTreeMap<ChainId, QuorumResult> {
    let mut chains = samples.chains(Metric::NotionalLimit);
    chains.extend(samples.chains(Metric::MaxTransactionSize));
    chains.sort_unstable();
    chains.dedup();

    chains
        .into_iter()
        .map(|chain_id| {
            (
                chain_id,
                QuorumResult {
                    chain_id,
                    notional_limit: quorum_for(samples, chain_id, Metric::NotionalLimit, k),
                    max_transaction_size: quorum_for(
                        samples,
                        chain_id,
                        Metric::MaxTransactionSize,
                        k,
                    ),
                    available_notional: None,
                },
            )
        })
        .collect()
}

/// Quorum-derived available notional for every chain present in status samples
pub fn status_quorum(samples: &SampleSet, k: usize) -> BTreeMap<ChainId, Option<u64>> {
    samples
        .chains(Metric::AvailableNotional)
        .into_iter()
        .map(|chain_id| {
            (
                chain_id,
                quorum_for(samples, chain_id, Metric::AvailableNotional, k),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_kth_largest() {
        assert_eq!(select_quorum(&[5, 1, 4, 2, 3], 1), Some(5));
        assert_eq!(select_quorum(&[5, 1, 4, 2, 3], 2), Some(4));
        assert_eq!(select_quorum(&[5, 1, 4, 2, 3], 5), Some(1));
    }

    #[test]
    fn test_select_without_quorum() {
        assert_eq!(select_quorum(&[5, 1, 4], 4), None);
        assert_eq!(select_quorum(&[], 1), None);
    }

    #[test]
    fn test_select_zero_k() {
        assert_eq!(select_quorum(&[5, 1, 4], 0), None);
    }

    #[test]
    fn test_select_with_ties() {
        assert_eq!(select_quorum(&[7, 7, 7, 3], 3), Some(7));
        assert_eq!(select_quorum(&[7, 7, 7, 3], 4), Some(3));
    }

    #[test]
    fn test_select_does_not_reorder_input() {
        let values = vec![1, 3, 2];
        let _ = select_quorum(&values, 2);
        assert_eq!(values, vec![1, 3, 2]);
    }
}
