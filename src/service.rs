//! Fetch-then-aggregate service used by the serving layer
//!
//! Fetching is bounded by the configured timeout. When it fails the error is
//! returned and aggregation is never invoked on partial input.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::config::AppConfig;
use crate::error::Result;
use crate::governor::{
    AvailableNotionalByChain, ChainFilter, ChainId, EnqueuedVaas, GovernorAggregator,
    GovernorLimit, NotionalAvailableDetail, NotionalLimitDetail, ReportSnapshot,
};
use crate::source::{fetch_all, DocumentReportSource, RelationalReportSource, SourceSet};

pub struct GovernorService {
    sources: SourceSet,
    aggregator: GovernorAggregator,
    fetch_timeout: Duration,
}

impl GovernorService {
    pub fn new(sources: SourceSet, aggregator: GovernorAggregator, fetch_timeout: Duration) -> Self {
        Self {
            sources,
            aggregator,
            fetch_timeout,
        }
    }

    /// Build the sources named in `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let mut sources: SourceSet = Vec::new();
        if let Some(path) = &config.source.documents_path {
            sources.push(Arc::new(DocumentReportSource::from_path(path)));
        }
        if let Some(url) = &config.source.database_url {
            sources.push(Arc::new(RelationalReportSource::connect_lazy(
                url,
                config.source.max_connections,
            )?));
        }

        Ok(Self::new(
            sources,
            GovernorAggregator::new(config.quorum_config()),
            config.fetch_timeout(),
        ))
    }

    pub fn aggregator(&self) -> &GovernorAggregator {
        &self.aggregator
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    /// Merged snapshot from every source
    pub async fn snapshot(&self, filter: &ChainFilter) -> Result<ReportSnapshot> {
        fetch_all(&self.sources, filter, self.fetch_timeout).await
    }

    #[instrument(skip(self))]
    pub async fn governor_limits(&self, filter: ChainFilter) -> Result<Vec<GovernorLimit>> {
        let snapshot = self.snapshot(&filter).await?;
        Ok(self.aggregator.governor_limits(&snapshot, &filter))
    }

    #[instrument(skip(self))]
    pub async fn notional_limit(&self, chain_id: ChainId) -> Result<Option<GovernorLimit>> {
        let snapshot = self.snapshot(&ChainFilter::Chain(chain_id)).await?;
        Ok(self.aggregator.notional_limit(&snapshot, chain_id))
    }

    #[instrument(skip(self))]
    pub async fn available_notional_by_chain(&self) -> Result<Vec<AvailableNotionalByChain>> {
        let snapshot = self.snapshot(&ChainFilter::All).await?;
        Ok(self.aggregator.available_notional_by_chain(&snapshot))
    }

    #[instrument(skip(self))]
    pub async fn enqueued_vaas(&self, filter: ChainFilter) -> Result<Vec<EnqueuedVaas>> {
        let snapshot = self.snapshot(&filter).await?;
        Ok(self.aggregator.enqueued_vaas(&snapshot, &filter))
    }

    #[instrument(skip(self))]
    pub async fn is_vaa_enqueued(
        &self,
        chain_id: ChainId,
        emitter_address: &str,
        sequence: u64,
    ) -> Result<bool> {
        let snapshot = self.snapshot(&ChainFilter::Chain(chain_id)).await?;
        Ok(self
            .aggregator
            .is_vaa_enqueued(&snapshot, chain_id, emitter_address, sequence))
    }

    #[instrument(skip(self))]
    pub async fn notional_limit_details(
        &self,
        filter: ChainFilter,
    ) -> Result<Vec<NotionalLimitDetail>> {
        let snapshot = self.snapshot(&filter).await?;
        Ok(self.aggregator.notional_limit_details(&snapshot, &filter))
    }

    #[instrument(skip(self))]
    pub async fn notional_available_details(
        &self,
        filter: ChainFilter,
    ) -> Result<Vec<NotionalAvailableDetail>> {
        let snapshot = self.snapshot(&filter).await?;
        Ok(self.aggregator.notional_available_details(&snapshot, &filter))
    }

    #[instrument(skip(self))]
    pub async fn max_available_notional(
        &self,
        chain_id: ChainId,
    ) -> Result<Option<NotionalAvailableDetail>> {
        let snapshot = self.snapshot(&ChainFilter::Chain(chain_id)).await?;
        Ok(self.aggregator.max_available_notional(&snapshot, chain_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_config_builds_document_source() {
        let mut config = AppConfig::default();
        config.source.documents_path = Some(PathBuf::from("/tmp/governor.json"));
        config.quorum.min_guardians = 3;

        let service = GovernorService::from_config(&config).unwrap();
        assert_eq!(service.aggregator().min_guardians(), 3);
        assert_eq!(service.source_names(), vec!["documents:/tmp/governor.json"]);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        assert!(GovernorService::from_config(&AppConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_surfaced() {
        let mut config = AppConfig::default();
        config.source.documents_path = Some(PathBuf::from("/nonexistent/governor.json"));
        let service = GovernorService::from_config(&config).unwrap();
        tokio_test::assert_err!(service.governor_limits(ChainFilter::All).await);
    }
}
