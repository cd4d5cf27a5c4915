//! In-memory report source holding a fixed snapshot

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::GuardianReportSource;
use crate::error::Result;
use crate::governor::{ChainFilter, GovernorConfigReport, GovernorStatusReport, ReportSnapshot};

/// Serves a snapshot held in memory; the snapshot can be replaced at runtime
pub struct MemoryReportSource {
    name: String,
    snapshot: RwLock<ReportSnapshot>,
}

impl MemoryReportSource {
    pub fn new(snapshot: ReportSnapshot) -> Self {
        Self::named("memory", snapshot)
    }

    pub fn named(name: impl Into<String>, snapshot: ReportSnapshot) -> Self {
        Self {
            name: name.into(),
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Replace the served snapshot
    pub async fn replace(&self, snapshot: ReportSnapshot) {
        *self.snapshot.write().await = snapshot;
    }
}

#[async_trait]
impl GuardianReportSource for MemoryReportSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_config_reports(&self, filter: &ChainFilter) -> Result<Vec<GovernorConfigReport>> {
        Ok(self.snapshot.read().await.filtered(filter).config)
    }

    async fn fetch_status_reports(&self, filter: &ChainFilter) -> Result<Vec<GovernorStatusReport>> {
        Ok(self.snapshot.read().await.filtered(filter).status)
    }
}
