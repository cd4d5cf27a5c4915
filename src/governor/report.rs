//! Raw guardian governor reports as yielded by report sources
//!
//! Per-chain numeric fields stay loosely typed so that one malformed entry
//! can be skipped during extraction without failing the whole fetch.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{ChainFilter, ChainId, GuardianId};

/// A guardian's governor configuration report
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernorConfigReport {
    pub guardian_id: GuardianId,
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub counter: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub chains: Vec<ConfigChainEntry>,
}

/// Per-chain entry of a configuration report
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigChainEntry {
    #[serde(default)]
    pub chain_id: Value,
    #[serde(default)]
    pub notional_limit: Value,
    #[serde(default, alias = "bigTransactionSize")]
    pub max_transaction_size: Value,
}

/// A guardian's governor status report
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernorStatusReport {
    pub guardian_id: GuardianId,
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub chains: Vec<StatusChainEntry>,
}

/// Per-chain entry of a status report
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChainEntry {
    #[serde(default)]
    pub chain_id: Value,
    #[serde(default, alias = "remainingAvailableNotional")]
    pub available_notional: Value,
    #[serde(default)]
    pub emitters: Vec<EmitterEntry>,
}

/// Emitter with messages currently held by the governor
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitterEntry {
    #[serde(default)]
    pub emitter_address: String,
    #[serde(default)]
    pub total_enqueued_vaas: Value,
    #[serde(default)]
    pub enqueued_vaas: Vec<EnqueuedVaaEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueuedVaaEntry {
    #[serde(default)]
    pub sequence: Value,
    #[serde(default)]
    pub release_time: Value,
    #[serde(default)]
    pub notional_value: Value,
    #[serde(default)]
    pub tx_hash: String,
}

/// Config and status reports fetched for one point in time
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    #[serde(default)]
    pub config: Vec<GovernorConfigReport>,
    #[serde(default)]
    pub status: Vec<GovernorStatusReport>,
}

impl ReportSnapshot {
    pub fn new(config: Vec<GovernorConfigReport>, status: Vec<GovernorStatusReport>) -> Self {
        Self { config, status }
    }

    pub fn is_empty(&self) -> bool {
        self.config.is_empty() && self.status.is_empty()
    }

    /// Copy of the snapshot holding only chain entries accepted by `filter`
    ///
    /// Reports left without any chain entry are kept; they contribute nothing.
    pub fn filtered(&self, filter: &ChainFilter) -> ReportSnapshot {
        if *filter == ChainFilter::All {
            return self.clone();
        }

        let keep = |raw: &Value| parse_chain_id(raw).is_some_and(|id| filter.matches(id));

        let config = self
            .config
            .iter()
            .map(|report| GovernorConfigReport {
                chains: report
                    .chains
                    .iter()
                    .filter(|c| keep(&c.chain_id))
                    .cloned()
                    .collect(),
                ..report.clone()
            })
            .collect();

        let status = self
            .status
            .iter()
            .map(|report| GovernorStatusReport {
                chains: report
                    .chains
                    .iter()
                    .filter(|c| keep(&c.chain_id))
                    .cloned()
                    .collect(),
                ..report.clone()
            })
            .collect();

        ReportSnapshot { config, status }
    }

    /// Merge another snapshot into this one, one report per guardian
    ///
    /// The report with the newest `updated_at` wins; on a tie the report
    /// already present is kept.
    pub fn merge(&mut self, other: ReportSnapshot) {
        for report in other.config {
            match self
                .config
                .iter_mut()
                .find(|r| r.guardian_id == report.guardian_id)
            {
                Some(existing) if report.updated_at > existing.updated_at => *existing = report,
                Some(_) => {}
                None => self.config.push(report),
            }
        }

        for report in other.status {
            match self
                .status
                .iter_mut()
                .find(|r| r.guardian_id == report.guardian_id)
            {
                Some(existing) if report.updated_at > existing.updated_at => *existing = report,
                Some(_) => {}
                None => self.status.push(report),
            }
        }
    }
}

/// Parse an unsigned integer the way document and relational stores emit it
///
/// Accepts JSON integers, decimal strings and extended-JSON
/// `{"$numberLong": "..."}` wrappers. Negative, fractional and non-numeric
/// values yield `None`.
pub fn parse_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Object(map) => map
            .get("$numberLong")
            .or_else(|| map.get("$numberInt"))
            .and_then(parse_u64),
        _ => None,
    }
}

/// Parse a chain id; zero and out of range values are rejected
pub fn parse_chain_id(value: &Value) -> Option<ChainId> {
    parse_u64(value)
        .and_then(|raw| ChainId::try_from(raw).ok())
        .filter(|id| *id != 0)
}

/// Parse a release time given as unix seconds or an RFC 3339 string
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    if let Value::String(s) = value {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    if let Value::Object(map) = value {
        if let Some(inner) = map.get("$date") {
            return parse_timestamp(inner);
        }
    }

    let secs = parse_u64(value)?;
    let secs = i64::try_from(secs).ok()?;
    Utc.timestamp_opt(secs, 0).single()
}
