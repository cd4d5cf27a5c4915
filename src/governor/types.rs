//! Core data structures produced by governor aggregation

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wormhole chain identifier
pub type ChainId = u16;

/// Address of a reporting guardian
///
/// Hex addresses are normalised to lowercase with a `0x` prefix so that the
/// same guardian reported by different stores compares equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct GuardianId(String);

impl GuardianId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if !digits.is_empty() && hex::decode(digits).is_ok() {
            Self(format!("0x{}", digits.to_ascii_lowercase()))
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for GuardianId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for GuardianId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<GuardianId> for String {
    fn from(value: GuardianId) -> Self {
        value.0
    }
}

impl fmt::Display for GuardianId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Governor metric a sample carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    /// Configured notional cap per window (config reports)
    NotionalLimit,
    /// Single transaction size above which a transfer is never delayed (config reports)
    MaxTransactionSize,
    /// Remaining headroom under the cap (status reports)
    AvailableNotional,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::NotionalLimit,
        Metric::MaxTransactionSize,
        Metric::AvailableNotional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::NotionalLimit => "notional_limit",
            Metric::MaxTransactionSize => "max_transaction_size",
            Metric::AvailableNotional => "available_notional",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value reported by one guardian for one chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricSample {
    pub guardian_id: GuardianId,
    pub chain_id: ChainId,
    pub metric: Metric,
    pub value: u64,
}

/// One guardian's full governor state for one chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    pub chain_id: ChainId,
    pub guardian_id: GuardianId,
    pub notional_limit: u64,
    pub max_transaction_size: u64,
    pub available_notional: u64,
}

/// Network-enforced values for one chain
///
/// `None` means fewer guardians than the quorum reported that metric.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuorumResult {
    pub chain_id: ChainId,
    pub notional_limit: Option<u64>,
    pub max_transaction_size: Option<u64>,
    pub available_notional: Option<u64>,
}

/// Quorum-derived governor limit as served on the wire
///
/// Metrics without quorum are reported as `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernorLimit {
    pub chain_id: ChainId,
    pub notional_limit: u64,
    pub max_transaction_size: u64,
    pub available_notional: u64,
}

impl From<QuorumResult> for GovernorLimit {
    fn from(result: QuorumResult) -> Self {
        Self {
            chain_id: result.chain_id,
            notional_limit: result.notional_limit.unwrap_or(0),
            max_transaction_size: result.max_transaction_size.unwrap_or(0),
            available_notional: result.available_notional.unwrap_or(0),
        }
    }
}

/// Worst-case single guardian report for one chain
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableNotionalByChain {
    pub chain_id: ChainId,
    pub notional_limit: u64,
    pub max_transaction_size: u64,
    pub available_notional: u64,
}

impl From<&Sample> for AvailableNotionalByChain {
    fn from(sample: &Sample) -> Self {
        Self {
            chain_id: sample.chain_id,
            notional_limit: sample.notional_limit,
            max_transaction_size: sample.max_transaction_size,
            available_notional: sample.available_notional,
        }
    }
}

/// Natural key of an enqueued message
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnqueuedVaaKey {
    pub emitter_address: String,
    pub sequence: u64,
    pub tx_hash: String,
}

/// A message held back by the governor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueuedVaaRecord {
    pub chain_id: ChainId,
    pub emitter_address: String,
    pub sequence: u64,
    pub notional_value: u64,
    pub tx_hash: String,
    pub release_time: Option<DateTime<Utc>>,
}

impl EnqueuedVaaRecord {
    pub fn key(&self) -> EnqueuedVaaKey {
        EnqueuedVaaKey {
            emitter_address: self.emitter_address.clone(),
            sequence: self.sequence,
            tx_hash: self.tx_hash.clone(),
        }
    }
}

/// Enqueued messages for one chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueuedVaas {
    pub chain_id: ChainId,
    pub enqueued_vaas: Vec<EnqueuedVaaRecord>,
}

/// Restricts fetching and aggregation to one chain
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChainFilter {
    #[default]
    All,
    Chain(ChainId),
}

impl ChainFilter {
    pub fn matches(&self, chain_id: ChainId) -> bool {
        match self {
            ChainFilter::All => true,
            ChainFilter::Chain(id) => *id == chain_id,
        }
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        match self {
            ChainFilter::All => None,
            ChainFilter::Chain(id) => Some(*id),
        }
    }
}

impl From<Option<ChainId>> for ChainFilter {
    fn from(chain: Option<ChainId>) -> Self {
        chain.map(ChainFilter::Chain).unwrap_or_default()
    }
}
