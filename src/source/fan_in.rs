//! Concurrent fetch across several report sources
//!
//! One task per source runs inside a `JoinSet`; all tasks are joined before
//! the snapshots are merged, so aggregation only ever sees a complete fetch.
//! Dropping the fetch, as the timeout does, aborts every task still running.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{info, warn};

use super::GuardianReportSource;
use crate::error::{Error, Result};
use crate::governor::{ChainFilter, ReportSnapshot};

/// Report sources fetched together
pub type SourceSet = Vec<Arc<dyn GuardianReportSource>>;

/// Fetch every source concurrently and merge the snapshots
///
/// Sources that fail are logged and left out. The call fails when no source
/// succeeds or when the fetch does not complete within `timeout`, in which
/// case the pending source fetches are cancelled.
pub async fn fetch_all(
    sources: &[Arc<dyn GuardianReportSource>],
    filter: &ChainFilter,
    timeout: Duration,
) -> Result<ReportSnapshot> {
    if sources.is_empty() {
        return Err(Error::NoSourcesAvailable);
    }

    tokio::time::timeout(timeout, fetch_concurrently(sources, *filter))
        .await
        .map_err(|_| {
            warn!("Report fetch timed out after {:?}", timeout);
            Error::FetchTimeout(timeout)
        })?
}

async fn fetch_concurrently(
    sources: &[Arc<dyn GuardianReportSource>],
    filter: ChainFilter,
) -> Result<ReportSnapshot> {
    let mut tasks = JoinSet::new();
    for (position, source) in sources.iter().enumerate() {
        let source = Arc::clone(source);
        tasks.spawn(async move {
            let result = source.fetch_snapshot(&filter).await;
            (position, source.name().to_string(), result)
        });
    }

    let mut results = Vec::with_capacity(sources.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(message) => results.push(message),
            Err(e) => warn!("Report fetch task failed: {}", e),
        }
    }
    // merge in source order so ties favour the first configured source
    results.sort_by_key(|(position, _, _)| *position);

    let mut merged: Option<ReportSnapshot> = None;
    let mut failures = Vec::new();

    for (_, name, result) in results {
        match result {
            Ok(snapshot) => {
                info!(
                    "Fetched {} config and {} status reports from {}",
                    snapshot.config.len(),
                    snapshot.status.len(),
                    name
                );
                match merged.as_mut() {
                    Some(existing) => existing.merge(snapshot),
                    None => merged = Some(snapshot),
                }
            }
            Err(e) => {
                warn!("Report source {} failed: {}", name, e);

                #[cfg(feature = "metrics")]
                crate::metrics::record_source_fetch_error(&name);

                failures.push(e);
            }
        }
    }

    match merged {
        Some(snapshot) => Ok(snapshot),
        None if failures.len() == 1 => Err(failures.remove(0)),
        None => Err(Error::NoSourcesAvailable),
    }
}
