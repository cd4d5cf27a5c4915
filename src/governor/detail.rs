//! Per-guardian governor listings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::report::{parse_chain_id, parse_u64, ReportSnapshot};
use super::types::{ChainFilter, ChainId, GuardianId};

/// One guardian's configured limits for one chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotionalLimitDetail {
    pub chain_id: ChainId,
    pub guardian_id: GuardianId,
    pub node_name: String,
    pub notional_limit: u64,
    pub max_transaction_size: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One guardian's available notional for one chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotionalAvailableDetail {
    pub chain_id: ChainId,
    pub guardian_id: GuardianId,
    pub node_name: String,
    pub available_notional: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Every config entry with both limits well formed, by chain then guardian
pub fn notional_limit_details(
    snapshot: &ReportSnapshot,
    filter: &ChainFilter,
) -> Vec<NotionalLimitDetail> {
    let mut details: Vec<NotionalLimitDetail> = snapshot
        .config
        .iter()
        .flat_map(|report| {
            report.chains.iter().filter_map(move |entry| {
                let chain_id = parse_chain_id(&entry.chain_id).filter(|id| filter.matches(*id))?;
                Some(NotionalLimitDetail {
                    chain_id,
                    guardian_id: report.guardian_id.clone(),
                    node_name: report.node_name.clone(),
                    notional_limit: parse_u64(&entry.notional_limit)?,
                    max_transaction_size: parse_u64(&entry.max_transaction_size)?,
                    updated_at: report.updated_at,
                })
            })
        })
        .collect();

    details.sort_by(|a, b| {
        a.chain_id
            .cmp(&b.chain_id)
            .then_with(|| a.guardian_id.cmp(&b.guardian_id))
    });
    details
}

/// Every well formed status entry, by chain then guardian
pub fn notional_available_details(
    snapshot: &ReportSnapshot,
    filter: &ChainFilter,
) -> Vec<NotionalAvailableDetail> {
    let mut details: Vec<NotionalAvailableDetail> = snapshot
        .status
        .iter()
        .flat_map(|report| {
            report.chains.iter().filter_map(move |entry| {
                let chain_id = parse_chain_id(&entry.chain_id).filter(|id| filter.matches(*id))?;
                Some(NotionalAvailableDetail {
                    chain_id,
                    guardian_id: report.guardian_id.clone(),
                    node_name: report.node_name.clone(),
                    available_notional: parse_u64(&entry.available_notional)?,
                    updated_at: report.updated_at,
                })
            })
        })
        .collect();

    details.sort_by(|a, b| {
        a.chain_id
            .cmp(&b.chain_id)
            .then_with(|| a.guardian_id.cmp(&b.guardian_id))
    });
    details
}

/// Highest available notional any guardian reports for a chain
pub fn max_available_notional(
    snapshot: &ReportSnapshot,
    chain_id: ChainId,
) -> Option<NotionalAvailableDetail> {
    notional_available_details(snapshot, &ChainFilter::Chain(chain_id))
        .into_iter()
        .reduce(|best, d| {
            if d.available_notional > best.available_notional {
                d
            } else {
                best
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::report::{GovernorStatusReport, StatusChainEntry};
    use serde_json::json;

    fn status(guardian: &str, chain: u16, available: serde_json::Value) -> GovernorStatusReport {
        GovernorStatusReport {
            guardian_id: GuardianId::new(guardian),
            node_name: format!("{guardian}-node"),
            created_at: None,
            updated_at: None,
            chains: vec![StatusChainEntry {
                chain_id: json!(chain),
                available_notional: available,
                emitters: vec![],
            }],
        }
    }

    #[test]
    fn test_available_details_sorted_and_filtered() {
        let snapshot = ReportSnapshot::new(
            vec![],
            vec![
                status("bb", 2, json!(10)),
                status("aa", 2, json!(20)),
                status("cc", 1, json!(30)),
                status("dd", 2, json!("n/a")),
            ],
        );

        let all = notional_available_details(&snapshot, &ChainFilter::All);
        let order: Vec<(u16, &str)> = all
            .iter()
            .map(|d| (d.chain_id, d.guardian_id.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "0xcc"), (2, "0xaa"), (2, "0xbb")]);

        let chain_two = notional_available_details(&snapshot, &ChainFilter::Chain(2));
        assert_eq!(chain_two.len(), 2);
        assert_eq!(chain_two[0].node_name, "aa-node");
    }

    #[test]
    fn test_max_available() {
        let snapshot = ReportSnapshot::new(
            vec![],
            vec![status("aa", 2, json!(10)), status("bb", 2, json!(25))],
        );

        let max = max_available_notional(&snapshot, 2).unwrap();
        assert_eq!(max.available_notional, 25);
        assert_eq!(max.guardian_id, GuardianId::new("bb"));
        assert!(max_available_notional(&snapshot, 3).is_none());
    }
}
