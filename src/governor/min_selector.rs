//! Worst-case reducer for the legacy available-notional endpoint
//!
//! Unlike the quorum selector this picks one whole guardian report per chain:
//! the one with the lowest available notional. A single guardian reporting an
//! artificially low value dominates the result.

use super::extractor::SampleSet;
use super::types::AvailableNotionalByChain;

/// Lowest available-notional report per chain, ascending by chain id
///
/// Ties keep the first sample in extraction order.
pub fn select_min_across_guardians(samples: &SampleSet) -> Vec<AvailableNotionalByChain> {
    samples
        .guardian_samples()
        .values()
        .filter_map(|chain_samples| {
            chain_samples
                .iter()
                .reduce(|best, s| {
                    if s.available_notional < best.available_notional {
                        s
                    } else {
                        best
                    }
                })
                .map(AvailableNotionalByChain::from)
        })
        .collect()
}
