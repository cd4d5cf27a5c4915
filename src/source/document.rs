//! Document-store report source
//!
//! Reads the `governorConfig` and `governorStatus` collections in the shape
//! the guardian gossip listener stores them: one document per guardian keyed
//! by its address, with the per-chain arrays nested under `parsedConfig` and
//! `parsedStatus`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::GuardianReportSource;
use crate::error::Result;
use crate::governor::report::parse_timestamp;
use crate::governor::{
    ChainFilter, ConfigChainEntry, EmitterEntry, EnqueuedVaaEntry, GovernorConfigReport,
    GovernorStatusReport, GuardianId, ReportSnapshot, StatusChainEntry,
};

/// Exported collections
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DocumentExport {
    #[serde(rename = "governorConfig", default)]
    pub governor_config: Vec<Value>,
    #[serde(rename = "governorStatus", default)]
    pub governor_status: Vec<Value>,
}

#[derive(Clone, Debug)]
enum DocumentOrigin {
    /// Re-read on every fetch
    File(PathBuf),
    Inline(DocumentExport),
}

/// Report source over document-store collections
pub struct DocumentReportSource {
    name: String,
    origin: DocumentOrigin,
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    nodename: String,
    #[serde(default)]
    counter: Value,
    #[serde(rename = "createdAt", default)]
    created_at: Value,
    #[serde(rename = "updatedAt", default)]
    updated_at: Value,
    #[serde(rename = "parsedConfig", default)]
    parsed_config: ParsedConfig,
}

#[derive(Debug, Default, Deserialize)]
struct ParsedConfig {
    #[serde(default)]
    chains: Vec<ConfigChainDocument>,
}

#[derive(Debug, Deserialize)]
struct ConfigChainDocument {
    #[serde(default)]
    chainid: Value,
    #[serde(default)]
    notionallimit: Value,
    #[serde(default)]
    bigtransactionsize: Value,
}

#[derive(Debug, Deserialize)]
struct StatusDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    nodename: String,
    #[serde(rename = "createdAt", default)]
    created_at: Value,
    #[serde(rename = "updatedAt", default)]
    updated_at: Value,
    #[serde(rename = "parsedStatus", default)]
    parsed_status: ParsedStatus,
}

#[derive(Debug, Default, Deserialize)]
struct ParsedStatus {
    #[serde(default)]
    chains: Vec<StatusChainDocument>,
}

#[derive(Debug, Deserialize)]
struct StatusChainDocument {
    #[serde(default)]
    chainid: Value,
    #[serde(default)]
    remainingavailablenotional: Value,
    #[serde(default)]
    emitters: Vec<EmitterDocument>,
}

#[derive(Debug, Deserialize)]
struct EmitterDocument {
    #[serde(default)]
    emitteraddress: String,
    #[serde(default)]
    totalenqueuedvaas: Value,
    #[serde(default)]
    enqueuedvaas: Vec<EnqueuedVaaDocument>,
}

#[derive(Debug, Deserialize)]
struct EnqueuedVaaDocument {
    #[serde(default)]
    sequence: Value,
    #[serde(default)]
    releasetime: Value,
    #[serde(default)]
    notionalvalue: Value,
    #[serde(default)]
    txhash: String,
}

impl From<ConfigDocument> for GovernorConfigReport {
    fn from(doc: ConfigDocument) -> Self {
        GovernorConfigReport {
            guardian_id: GuardianId::new(&doc.id),
            node_name: doc.nodename,
            counter: doc.counter.as_i64().unwrap_or_default(),
            created_at: parse_timestamp(&doc.created_at),
            updated_at: parse_timestamp(&doc.updated_at),
            chains: doc
                .parsed_config
                .chains
                .into_iter()
                .map(|c| ConfigChainEntry {
                    chain_id: c.chainid,
                    notional_limit: c.notionallimit,
                    max_transaction_size: c.bigtransactionsize,
                })
                .collect(),
        }
    }
}

impl From<StatusDocument> for GovernorStatusReport {
    fn from(doc: StatusDocument) -> Self {
        GovernorStatusReport {
            guardian_id: GuardianId::new(&doc.id),
            node_name: doc.nodename,
            created_at: parse_timestamp(&doc.created_at),
            updated_at: parse_timestamp(&doc.updated_at),
            chains: doc
                .parsed_status
                .chains
                .into_iter()
                .map(|c| StatusChainEntry {
                    chain_id: c.chainid,
                    available_notional: c.remainingavailablenotional,
                    emitters: c
                        .emitters
                        .into_iter()
                        .map(|e| EmitterEntry {
                            emitter_address: e.emitteraddress,
                            total_enqueued_vaas: e.totalenqueuedvaas,
                            enqueued_vaas: e
                                .enqueuedvaas
                                .into_iter()
                                .map(|v| EnqueuedVaaEntry {
                                    sequence: v.sequence,
                                    release_time: v.releasetime,
                                    notional_value: v.notionalvalue,
                                    tx_hash: v.txhash,
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl DocumentReportSource {
    /// Source over an exported JSON file, re-read on every fetch
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: format!("documents:{}", path.display()),
            origin: DocumentOrigin::File(path),
        }
    }

    /// Source over documents already held in memory
    pub fn from_documents(config: Vec<Value>, status: Vec<Value>) -> Self {
        Self {
            name: "documents".to_string(),
            origin: DocumentOrigin::Inline(DocumentExport {
                governor_config: config,
                governor_status: status,
            }),
        }
    }

    async fn export(&self) -> Result<DocumentExport> {
        match &self.origin {
            DocumentOrigin::File(path) => {
                let raw = tokio::fs::read_to_string(path).await?;
                let export: DocumentExport = serde_json::from_str(&raw)?;
                debug!(
                    "Loaded {} config and {} status documents from {}",
                    export.governor_config.len(),
                    export.governor_status.len(),
                    path.display()
                );
                Ok(export)
            }
            DocumentOrigin::Inline(export) => Ok(export.clone()),
        }
    }

    /// Snapshot of every parseable document, filtered by chain
    pub async fn load_snapshot(&self, filter: &ChainFilter) -> Result<ReportSnapshot> {
        let export = self.export().await?;
        let config = decode_documents::<ConfigDocument, GovernorConfigReport>(
            &self.name,
            "governorConfig",
            export.governor_config,
        );
        let status = decode_documents::<StatusDocument, GovernorStatusReport>(
            &self.name,
            "governorStatus",
            export.governor_status,
        );
        Ok(ReportSnapshot::new(config, status).filtered(filter))
    }
}

/// Decode documents one by one so a malformed document only drops itself
fn decode_documents<D, R>(source: &str, collection: &str, documents: Vec<Value>) -> Vec<R>
where
    D: for<'de> Deserialize<'de>,
    R: From<D>,
{
    documents
        .into_iter()
        .filter_map(|doc| match serde_json::from_value::<D>(doc) {
            Ok(parsed) => Some(R::from(parsed)),
            Err(e) => {
                warn!("{}: skipping malformed {} document: {}", source, collection, e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl GuardianReportSource for DocumentReportSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_config_reports(&self, filter: &ChainFilter) -> Result<Vec<GovernorConfigReport>> {
        Ok(self.load_snapshot(filter).await?.config)
    }

    async fn fetch_status_reports(&self, filter: &ChainFilter) -> Result<Vec<GovernorStatusReport>> {
        Ok(self.load_snapshot(filter).await?.status)
    }

    async fn fetch_snapshot(&self, filter: &ChainFilter) -> Result<ReportSnapshot> {
        self.load_snapshot(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn config_doc() -> Value {
        json!({
            "_id": "0xABCDEF0123456789ABCDEF0123456789ABCDEF01",
            "nodename": "guardian-a",
            "counter": 42,
            "createdAt": "2024-03-01T00:00:00Z",
            "updatedAt": {"$date": "2024-03-02T00:00:00Z"},
            "parsedConfig": {
                "chains": [
                    {"chainid": 2, "notionallimit": {"$numberLong": "50000000"}, "bigtransactionsize": 5000000},
                    {"chainid": 4, "notionallimit": 5000000, "bigtransactionsize": "500000"}
                ]
            }
        })
    }

    fn status_doc() -> Value {
        json!({
            "_id": "0xabcdef0123456789abcdef0123456789abcdef01",
            "nodename": "guardian-a",
            "parsedStatus": {
                "chains": [{
                    "chainid": 2,
                    "remainingavailablenotional": 4000000,
                    "emitters": [{
                        "emitteraddress": "0x0000000000000000000000003ee18b2214aff97000d974cf647e7c347e8fa585",
                        "totalenqueuedvaas": 1,
                        "enqueuedvaas": [{
                            "sequence": "300",
                            "releasetime": 1709337600,
                            "notionalvalue": 2500000,
                            "txhash": "0x01"
                        }]
                    }]
                }]
            }
        })
    }

    #[tokio::test]
    async fn test_inline_documents_decode() {
        let source = DocumentReportSource::from_documents(vec![config_doc()], vec![status_doc()]);
        let snapshot = source.fetch_snapshot(&ChainFilter::All).await.unwrap();

        let config = &snapshot.config[0];
        assert_eq!(config.node_name, "guardian-a");
        assert_eq!(config.counter, 42);
        assert_eq!(config.chains.len(), 2);
        assert!(config.updated_at.is_some());
        assert_eq!(snapshot.status[0].guardian_id, config.guardian_id);

        let vaa = &snapshot.status[0].chains[0].emitters[0].enqueued_vaas[0];
        assert_eq!(vaa.sequence, json!("300"));
    }

    #[tokio::test]
    async fn test_malformed_document_is_skipped() {
        let source = DocumentReportSource::from_documents(
            vec![json!({"nodename": "no-id"}), config_doc()],
            vec![json!("not an object")],
        );
        let snapshot = source.fetch_snapshot(&ChainFilter::All).await.unwrap();
        assert_eq!(snapshot.config.len(), 1);
        assert!(snapshot.status.is_empty());
    }

    #[tokio::test]
    async fn test_chain_filter_applies() {
        let source = DocumentReportSource::from_documents(vec![config_doc()], vec![]);
        let config = source
            .fetch_config_reports(&ChainFilter::Chain(4))
            .await
            .unwrap();
        assert_eq!(config[0].chains.len(), 1);
    }

    #[tokio::test]
    async fn test_file_source_reads_export() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let export = json!({
            "governorConfig": [config_doc()],
            "governorStatus": [status_doc()]
        });
        write!(file, "{}", export).unwrap();

        let source = DocumentReportSource::from_path(file.path());
        let snapshot = source.fetch_snapshot(&ChainFilter::All).await.unwrap();
        assert_eq!(snapshot.config.len(), 1);
        assert_eq!(snapshot.status.len(), 1);
        assert!(source.name().starts_with("documents:"));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let source = DocumentReportSource::from_path("/nonexistent/governor.json");
        assert!(source.fetch_snapshot(&ChainFilter::All).await.is_err());
    }
}
