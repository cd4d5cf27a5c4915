//! Guardian governor quorum aggregation
//!
//! Each guardian independently reports its governor configuration (notional
//! limit and maximum transaction size per chain) and status (available
//! notional and enqueued messages). No single report can be trusted alone;
//! this module derives the values the network as a whole enforces.

pub mod aggregator;
pub mod detail;
pub mod enqueued;
pub mod extractor;
pub mod guardian_set;
pub mod joiner;
pub mod min_selector;
pub mod quorum;
pub mod report;
pub mod types;

pub use aggregator::GovernorAggregator;
pub use detail::{NotionalAvailableDetail, NotionalLimitDetail};
pub use enqueued::{collect_enqueued, dedup_enqueued, group_by_chain};
pub use extractor::{extract_samples, ExtractionStats, SampleSet, SkipReason};
pub use guardian_set::{GuardianSet, QuorumConfig, DEFAULT_MIN_GUARDIANS};
pub use joiner::{join_config_status, join_governor_limits};
pub use min_selector::select_min_across_guardians;
pub use quorum::{config_quorum, select_quorum, status_quorum};
pub use report::{
    ConfigChainEntry, EmitterEntry, EnqueuedVaaEntry, GovernorConfigReport, GovernorStatusReport,
    ReportSnapshot, StatusChainEntry,
};
pub use types::{
    AvailableNotionalByChain, ChainFilter, ChainId, EnqueuedVaaKey, EnqueuedVaaRecord,
    EnqueuedVaas, GovernorLimit, GuardianId, Metric, MetricSample, QuorumResult, Sample,
};
