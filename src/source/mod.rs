//! Guardian report sources
//!
//! A source yields the raw config and status reports guardians published.
//! Every backend feeds the same [`ReportSnapshot`] shape, and aggregation is
//! implemented once in [`crate::governor`] on top of it.

pub mod document;
pub mod fan_in;
pub mod memory;
pub mod relational;

use async_trait::async_trait;

use crate::error::Result;
use crate::governor::{
    extract_samples, ChainFilter, GovernorConfigReport, GovernorStatusReport, ReportSnapshot,
    SampleSet,
};

pub use document::DocumentReportSource;
pub use fan_in::{fetch_all, SourceSet};
pub use memory::MemoryReportSource;
pub use relational::RelationalReportSource;

/// Yields raw guardian governor reports
#[async_trait]
pub trait GuardianReportSource: Send + Sync {
    /// Name used in logs and metrics
    fn name(&self) -> &str;

    async fn fetch_config_reports(&self, filter: &ChainFilter) -> Result<Vec<GovernorConfigReport>>;

    async fn fetch_status_reports(&self, filter: &ChainFilter) -> Result<Vec<GovernorStatusReport>>;

    /// Config and status reports fetched concurrently
    async fn fetch_snapshot(&self, filter: &ChainFilter) -> Result<ReportSnapshot> {
        let (config, status) = tokio::try_join!(
            self.fetch_config_reports(filter),
            self.fetch_status_reports(filter)
        )?;
        Ok(ReportSnapshot::new(config, status))
    }
}

/// Samples from any report source through the shared extractor
#[async_trait]
pub trait SampleProvider {
    async fn fetch_samples(&self, filter: &ChainFilter) -> Result<SampleSet>;
}

#[async_trait]
impl<T> SampleProvider for T
where
    T: GuardianReportSource + ?Sized,
{
    async fn fetch_samples(&self, filter: &ChainFilter) -> Result<SampleSet> {
        let snapshot = self.fetch_snapshot(filter).await?;
        Ok(extract_samples(&snapshot.filtered(filter)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::{ConfigChainEntry, GuardianId, Metric};
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_samples_uses_shared_extractor() {
        let source = MemoryReportSource::new(ReportSnapshot::new(
            vec![GovernorConfigReport {
                guardian_id: GuardianId::new("g1"),
                node_name: "g1".to_string(),
                counter: 0,
                created_at: None,
                updated_at: None,
                chains: vec![
                    ConfigChainEntry {
                        chain_id: json!(1),
                        notional_limit: json!(10),
                        max_transaction_size: json!(1),
                    },
                    ConfigChainEntry {
                        chain_id: json!(2),
                        notional_limit: json!(20),
                        max_transaction_size: json!(2),
                    },
                ],
            }],
            vec![],
        ));

        let samples = source.fetch_samples(&ChainFilter::Chain(2)).await.unwrap();
        assert_eq!(samples.chains(Metric::NotionalLimit), vec![2]);
        assert_eq!(samples.values(2, Metric::NotionalLimit), vec![20]);
    }
}
