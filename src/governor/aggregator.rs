//! Governor aggregation over a report snapshot
//!
//! Every report source feeds this single implementation. All operations are
//! pure and synchronous; an aggregator can be shared across requests.

use std::time::Instant;

use tracing::info;

use super::detail::{
    max_available_notional, notional_available_details, notional_limit_details,
    NotionalAvailableDetail, NotionalLimitDetail,
};
use super::enqueued::{collect_enqueued, dedup_enqueued, group_by_chain};
use super::extractor::{extract_samples, ExtractionStats};
use super::guardian_set::QuorumConfig;
use super::joiner::join_governor_limits;
use super::min_selector::select_min_across_guardians;
use super::quorum::{config_quorum, status_quorum};
use super::report::ReportSnapshot;
use super::types::{AvailableNotionalByChain, ChainFilter, ChainId, EnqueuedVaas, GovernorLimit};

/// Reconciles guardian reports into network-enforced governor values
#[derive(Clone, Debug)]
pub struct GovernorAggregator {
    quorum: QuorumConfig,
}

impl Default for GovernorAggregator {
    fn default() -> Self {
        Self::new(QuorumConfig::default())
    }
}

impl GovernorAggregator {
    pub fn new(quorum: QuorumConfig) -> Self {
        Self { quorum }
    }

    /// Aggregator with a fixed quorum size
    pub fn with_min_guardians(min_guardians: usize) -> Self {
        Self::new(QuorumConfig::Fixed { min_guardians })
    }

    pub fn min_guardians(&self) -> usize {
        self.quorum.min_guardians()
    }

    pub fn quorum(&self) -> &QuorumConfig {
        &self.quorum
    }

    /// Quorum-derived limits for every chain present in both config and status reports
    pub fn governor_limits(
        &self,
        snapshot: &ReportSnapshot,
        filter: &ChainFilter,
    ) -> Vec<GovernorLimit> {
        let started = Instant::now();
        let k = self.min_guardians();
        let samples = extract_samples(&snapshot.filtered(filter));

        let limits = join_governor_limits(&config_quorum(&samples, k), &status_quorum(&samples, k));

        info!(
            "Aggregated governor limits for {} chains from {} config and {} status reports (quorum={}, skipped={})",
            limits.len(),
            snapshot.config.len(),
            snapshot.status.len(),
            k,
            samples.stats().total_skipped()
        );
        observe("governor_limits", started);

        limits
    }

    /// Quorum-derived limit for a single chain
    pub fn notional_limit(&self, snapshot: &ReportSnapshot, chain_id: ChainId) -> Option<GovernorLimit> {
        self.governor_limits(snapshot, &ChainFilter::Chain(chain_id))
            .into_iter()
            .next()
    }

    /// Worst-case single guardian report per chain
    pub fn available_notional_by_chain(
        &self,
        snapshot: &ReportSnapshot,
    ) -> Vec<AvailableNotionalByChain> {
        let started = Instant::now();
        let result = select_min_across_guardians(&extract_samples(snapshot));
        observe("available_notional_by_chain", started);
        result
    }

    /// Deduplicated enqueued messages grouped by chain
    pub fn enqueued_vaas(&self, snapshot: &ReportSnapshot, filter: &ChainFilter) -> Vec<EnqueuedVaas> {
        let started = Instant::now();
        let mut stats = ExtractionStats::default();

        let records = collect_enqueued(&snapshot.filtered(filter), &mut stats);
        let total = records.len();
        let unique = dedup_enqueued(records);

        info!(
            "Collapsed {} enqueued VAA reports into {} unique messages (skipped={})",
            total,
            unique.len(),
            stats.total_skipped()
        );

        let grouped = group_by_chain(unique);
        observe("enqueued_vaas", started);
        grouped
    }

    /// Whether any guardian reports the message as enqueued
    pub fn is_vaa_enqueued(
        &self,
        snapshot: &ReportSnapshot,
        chain_id: ChainId,
        emitter_address: &str,
        sequence: u64,
    ) -> bool {
        let mut stats = ExtractionStats::default();
        collect_enqueued(&snapshot.filtered(&ChainFilter::Chain(chain_id)), &mut stats)
            .iter()
            .any(|r| r.sequence == sequence && r.emitter_address.eq_ignore_ascii_case(emitter_address.trim()))
    }

    pub fn notional_limit_details(
        &self,
        snapshot: &ReportSnapshot,
        filter: &ChainFilter,
    ) -> Vec<NotionalLimitDetail> {
        notional_limit_details(snapshot, filter)
    }

    pub fn notional_available_details(
        &self,
        snapshot: &ReportSnapshot,
        filter: &ChainFilter,
    ) -> Vec<NotionalAvailableDetail> {
        notional_available_details(snapshot, filter)
    }

    /// Most permissive available notional reported for a chain
    pub fn max_available_notional(
        &self,
        snapshot: &ReportSnapshot,
        chain_id: ChainId,
    ) -> Option<NotionalAvailableDetail> {
        max_available_notional(snapshot, chain_id)
    }
}

#[cfg(feature = "metrics")]
fn observe(operation: &str, started: Instant) {
    crate::metrics::observe_aggregation(operation, started.elapsed().as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
fn observe(_operation: &str, _started: Instant) {}
