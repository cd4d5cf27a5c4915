//! Flattens nested guardian reports into per-chain metric samples

use std::collections::BTreeMap;

use tracing::debug;

use super::report::{parse_chain_id, parse_u64, ReportSnapshot};
use super::types::{ChainId, GuardianId, Metric, MetricSample, Sample};

/// Why an entry did not produce a sample
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// Missing, zero or out of range chain id
    InvalidChainId,
    /// Metric value absent or not an unsigned integer
    InvalidValue,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::InvalidChainId => "invalid_chain_id",
            SkipReason::InvalidValue => "invalid_value",
        }
    }
}

/// Counts of kept and skipped entries for one extraction
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub samples: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl ExtractionStats {
    pub(crate) fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_default() += 1;

        #[cfg(feature = "metrics")]
        crate::metrics::record_extraction_skip(reason.as_str());
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Samples grouped by chain and metric
#[derive(Clone, Debug, Default)]
pub struct SampleSet {
    samples: BTreeMap<(ChainId, Metric), Vec<MetricSample>>,
    node_names: BTreeMap<GuardianId, String>,
    stats: ExtractionStats,
}

impl SampleSet {
    fn push(&mut self, sample: MetricSample) {
        self.stats.samples += 1;
        self.samples
            .entry((sample.chain_id, sample.metric))
            .or_default()
            .push(sample);
    }

    /// Samples for one chain and metric in extraction order
    pub fn samples(&self, chain_id: ChainId, metric: Metric) -> &[MetricSample] {
        self.samples
            .get(&(chain_id, metric))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reported values for one chain and metric
    pub fn values(&self, chain_id: ChainId, metric: Metric) -> Vec<u64> {
        self.samples(chain_id, metric)
            .iter()
            .map(|s| s.value)
            .collect()
    }

    /// Chains with at least one sample of `metric`, ascending
    pub fn chains(&self, metric: Metric) -> Vec<ChainId> {
        self.samples
            .keys()
            .filter(|(_, m)| *m == metric)
            .map(|(chain, _)| *chain)
            .collect()
    }

    pub fn node_name(&self, guardian_id: &GuardianId) -> Option<&str> {
        self.node_names.get(guardian_id).map(String::as_str)
    }

    pub fn stats(&self) -> &ExtractionStats {
        &self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whole-report samples per chain, one per guardian that reported the
    /// chain's available notional
    ///
    /// Config values come from the same guardian's config report for that
    /// chain and default to `0` when that guardian did not report them.
    pub fn guardian_samples(&self) -> BTreeMap<ChainId, Vec<Sample>> {
        let mut out: BTreeMap<ChainId, Vec<Sample>> = BTreeMap::new();

        for chain_id in self.chains(Metric::AvailableNotional) {
            let config_value = |metric: Metric, guardian: &GuardianId| {
                self.samples(chain_id, metric)
                    .iter()
                    .find(|s| &s.guardian_id == guardian)
                    .map(|s| s.value)
                    .unwrap_or(0)
            };

            let samples = self
                .samples(chain_id, Metric::AvailableNotional)
                .iter()
                .map(|status| Sample {
                    chain_id,
                    guardian_id: status.guardian_id.clone(),
                    notional_limit: config_value(Metric::NotionalLimit, &status.guardian_id),
                    max_transaction_size: config_value(
                        Metric::MaxTransactionSize,
                        &status.guardian_id,
                    ),
                    available_notional: status.value,
                })
                .collect();

            out.insert(chain_id, samples);
        }

        out
    }
}

/// Flatten every config and status report into metric samples
///
/// Never fails: malformed entries are skipped and counted in the returned
/// set's [`ExtractionStats`].
pub fn extract_samples(snapshot: &ReportSnapshot) -> SampleSet {
    let mut set = SampleSet::default();

    for report in &snapshot.config {
        set.node_names
            .entry(report.guardian_id.clone())
            .or_insert_with(|| report.node_name.clone());

        for entry in &report.chains {
            let Some(chain_id) = parse_chain_id(&entry.chain_id) else {
                debug!(
                    "Skipping config entry from {} with invalid chain id {}",
                    report.guardian_id, entry.chain_id
                );
                set.stats.record_skip(SkipReason::InvalidChainId);
                continue;
            };

            for (metric, raw) in [
                (Metric::NotionalLimit, &entry.notional_limit),
                (Metric::MaxTransactionSize, &entry.max_transaction_size),
            ] {
                match parse_u64(raw) {
                    Some(value) => set.push(MetricSample {
                        guardian_id: report.guardian_id.clone(),
                        chain_id,
                        metric,
                        value,
                    }),
                    None => {
                        debug!(
                            "Skipping {} for chain {} from {}: {}",
                            metric, chain_id, report.guardian_id, raw
                        );
                        set.stats.record_skip(SkipReason::InvalidValue);
                    }
                }
            }
        }
    }

    for report in &snapshot.status {
        set.node_names
            .entry(report.guardian_id.clone())
            .or_insert_with(|| report.node_name.clone());

        for entry in &report.chains {
            let Some(chain_id) = parse_chain_id(&entry.chain_id) else {
                debug!(
                    "Skipping status entry from {} with invalid chain id {}",
                    report.guardian_id, entry.chain_id
                );
                set.stats.record_skip(SkipReason::InvalidChainId);
                continue;
            };

            match parse_u64(&entry.available_notional) {
                Some(value) => set.push(MetricSample {
                    guardian_id: report.guardian_id.clone(),
                    chain_id,
                    metric: Metric::AvailableNotional,
                    value,
                }),
                None => {
                    debug!(
                        "Skipping available notional for chain {} from {}: {}",
                        chain_id, report.guardian_id, entry.available_notional
                    );
                    set.stats.record_skip(SkipReason::InvalidValue);
                }
            }
        }
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::report::{
        ConfigChainEntry, GovernorConfigReport, GovernorStatusReport, StatusChainEntry,
    };
    use serde_json::{json, Value};

    fn config(guardian: &str, entries: Vec<(Value, Value, Value)>) -> GovernorConfigReport {
        GovernorConfigReport {
            guardian_id: GuardianId::new(guardian),
            node_name: format!("node-{guardian}"),
            counter: 1,
            created_at: None,
            updated_at: None,
            chains: entries
                .into_iter()
                .map(|(chain_id, notional_limit, max_transaction_size)| ConfigChainEntry {
                    chain_id,
                    notional_limit,
                    max_transaction_size,
                })
                .collect(),
        }
    }

    fn status(guardian: &str, entries: Vec<(Value, Value)>) -> GovernorStatusReport {
        GovernorStatusReport {
            guardian_id: GuardianId::new(guardian),
            node_name: format!("node-{guardian}"),
            created_at: None,
            updated_at: None,
            chains: entries
                .into_iter()
                .map(|(chain_id, available_notional)| StatusChainEntry {
                    chain_id,
                    available_notional,
                    emitters: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn test_extract_flattens_chains() {
        let snapshot = ReportSnapshot::new(
            vec![
                config("g1", vec![(json!(1), json!(100), json!(10)), (json!(2), json!(200), json!(20))]),
                config("g2", vec![(json!(1), json!(150), json!(15))]),
            ],
            vec![status("g1", vec![(json!(1), json!(50))])],
        );

        let set = extract_samples(&snapshot);
        assert_eq!(set.values(1, Metric::NotionalLimit), vec![100, 150]);
        assert_eq!(set.values(2, Metric::MaxTransactionSize), vec![20]);
        assert_eq!(set.values(1, Metric::AvailableNotional), vec![50]);
        assert!(set.values(2, Metric::AvailableNotional).is_empty());
        assert_eq!(set.chains(Metric::NotionalLimit), vec![1, 2]);
        assert_eq!(set.stats().samples, 7);
        assert_eq!(set.node_name(&GuardianId::new("g2")), Some("node-g2"));
    }

    #[test]
    fn test_extract_skips_bad_chain_ids() {
        let snapshot = ReportSnapshot::new(
            vec![config(
                "g1",
                vec![
                    (json!(0), json!(1), json!(1)),
                    (Value::Null, json!(1), json!(1)),
                    (json!(4), json!(1), json!(1)),
                ],
            )],
            vec![status("g1", vec![(json!("x"), json!(3))])],
        );

        let set = extract_samples(&snapshot);
        assert_eq!(set.chains(Metric::NotionalLimit), vec![4]);
        assert!(set.chains(Metric::AvailableNotional).is_empty());
        assert_eq!(set.stats().skipped[&SkipReason::InvalidChainId], 3);
    }

    #[test]
    fn test_extract_skips_only_the_malformed_metric() {
        let snapshot = ReportSnapshot::new(
            vec![config("g1", vec![(json!(2), json!("lots"), json!({"$numberLong": "77"}))])],
            vec![status("g1", vec![(json!(2), json!(-5))])],
        );

        let set = extract_samples(&snapshot);
        assert!(set.values(2, Metric::NotionalLimit).is_empty());
        assert_eq!(set.values(2, Metric::MaxTransactionSize), vec![77]);
        assert!(set.values(2, Metric::AvailableNotional).is_empty());
        assert_eq!(set.stats().skipped[&SkipReason::InvalidValue], 2);
        assert_eq!(set.stats().total_skipped(), 2);
    }

    #[test]
    fn test_guardian_samples_pairs_config_with_status() {
        let snapshot = ReportSnapshot::new(
            vec![config("g1", vec![(json!(1), json!(100), json!(10))])],
            vec![
                status("g1", vec![(json!(1), json!(40))]),
                status("g2", vec![(json!(1), json!(60))]),
            ],
        );

        let samples = extract_samples(&snapshot).guardian_samples();
        let chain = &samples[&1];
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].notional_limit, 100);
        assert_eq!(chain[0].max_transaction_size, 10);
        assert_eq!(chain[0].available_notional, 40);
        assert_eq!(chain[1].notional_limit, 0);
        assert_eq!(chain[1].available_notional, 60);
    }

    #[test]
    fn test_extract_empty_snapshot() {
        let set = extract_samples(&ReportSnapshot::default());
        assert!(set.is_empty());
        assert_eq!(set.stats().total_skipped(), 0);
    }
}
