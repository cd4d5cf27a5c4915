//! Collapses the enqueued-message lists every guardian reports redundantly

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use super::extractor::{ExtractionStats, SkipReason};
use super::report::{parse_chain_id, parse_timestamp, parse_u64, ReportSnapshot};
use super::types::{ChainId, EnqueuedVaaRecord, EnqueuedVaas};

/// Emitter addresses compare as lowercase hex
fn normalize_emitter(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Walk every status report and yield its enqueued messages in report order
///
/// Emitter addresses are lowercased. Entries on an invalid chain, or with a
/// non-numeric sequence or notional value, are skipped and counted in `stats`.
pub fn collect_enqueued(
    snapshot: &ReportSnapshot,
    stats: &mut ExtractionStats,
) -> Vec<EnqueuedVaaRecord> {
    let mut records = Vec::new();

    for report in &snapshot.status {
        for chain in &report.chains {
            let Some(chain_id) = parse_chain_id(&chain.chain_id) else {
                if chain.emitters.iter().any(|e| !e.enqueued_vaas.is_empty()) {
                    stats.record_skip(SkipReason::InvalidChainId);
                }
                continue;
            };

            for emitter in &chain.emitters {
                let emitter_address = normalize_emitter(&emitter.emitter_address);
                for vaa in &emitter.enqueued_vaas {
                    let (Some(sequence), Some(notional_value)) =
                        (parse_u64(&vaa.sequence), parse_u64(&vaa.notional_value))
                    else {
                        debug!(
                            "Skipping enqueued VAA {}/{} from {}: malformed sequence or notional",
                            chain_id, emitter.emitter_address, report.guardian_id
                        );
                        stats.record_skip(SkipReason::InvalidValue);
                        continue;
                    };

                    records.push(EnqueuedVaaRecord {
                        chain_id,
                        emitter_address: emitter_address.clone(),
                        sequence,
                        notional_value,
                        tx_hash: vaa.tx_hash.clone(),
                        release_time: parse_timestamp(&vaa.release_time),
                    });
                }
            }
        }
    }

    records
}

/// Keep the first record seen for each key, preserving first-seen order
///
/// Later duplicates are dropped even when their non-key fields differ.
pub fn dedup_enqueued(records: Vec<EnqueuedVaaRecord>) -> Vec<EnqueuedVaaRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.key()))
        .collect()
}

/// Group records by chain, ascending, keeping record order within a chain
pub fn group_by_chain(records: Vec<EnqueuedVaaRecord>) -> Vec<EnqueuedVaas> {
    let mut grouped: BTreeMap<ChainId, Vec<EnqueuedVaaRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.chain_id).or_default().push(record);
    }

    grouped
        .into_iter()
        .map(|(chain_id, enqueued_vaas)| EnqueuedVaas {
            chain_id,
            enqueued_vaas,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::report::{EmitterEntry, EnqueuedVaaEntry, GovernorStatusReport, StatusChainEntry};
    use crate::governor::types::GuardianId;
    use serde_json::json;

    fn record(chain_id: ChainId, emitter: &str, sequence: u64, notional: u64) -> EnqueuedVaaRecord {
        EnqueuedVaaRecord {
            chain_id,
            emitter_address: emitter.to_string(),
            sequence,
            notional_value: notional,
            tx_hash: format!("0x{sequence:064x}"),
            release_time: None,
        }
    }

    #[test]
    fn test_dedup_first_seen_wins() {
        let records = vec![
            record(2, "e1", 1, 100),
            record(2, "e1", 1, 101),
            record(2, "e1", 2, 50),
        ];

        let deduped = dedup_enqueued(records);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].notional_value, 100);
        assert_eq!(deduped[1].sequence, 2);
    }

    #[test]
    fn test_dedup_distinguishes_tx_hash() {
        let mut other = record(2, "e1", 1, 100);
        other.tx_hash = "0xother".to_string();

        let deduped = dedup_enqueued(vec![record(2, "e1", 1, 100), other]);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn test_group_by_chain_sorted() {
        let grouped = group_by_chain(vec![
            record(5, "e1", 1, 1),
            record(2, "e2", 7, 1),
            record(5, "e1", 3, 1),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].chain_id, 2);
        assert_eq!(grouped[1].chain_id, 5);
        let sequences: Vec<u64> = grouped[1].enqueued_vaas.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1, 3]);
    }

    fn status_with_emitter(guardian: &str, emitter: &str) -> GovernorStatusReport {
        GovernorStatusReport {
            guardian_id: GuardianId::new(guardian),
            node_name: String::new(),
            created_at: None,
            updated_at: None,
            chains: vec![StatusChainEntry {
                chain_id: json!(2),
                available_notional: json!(10),
                emitters: vec![EmitterEntry {
                    emitter_address: emitter.to_string(),
                    total_enqueued_vaas: json!(1),
                    enqueued_vaas: vec![EnqueuedVaaEntry {
                        sequence: json!(9),
                        release_time: json!(1_700_000_000),
                        notional_value: json!(500),
                        tx_hash: "0xabc".to_string(),
                    }],
                }],
            }],
        }
    }

    #[test]
    fn test_emitter_case_does_not_split_messages() {
        let snapshot = ReportSnapshot::new(
            vec![],
            vec![
                status_with_emitter("g1", "0xABCDEF"),
                status_with_emitter("g2", " 0xabcdef"),
            ],
        );

        let mut stats = ExtractionStats::default();
        let deduped = dedup_enqueued(collect_enqueued(&snapshot, &mut stats));
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].emitter_address, "0xabcdef");
    }

    #[test]
    fn test_collect_skips_malformed() {
        let snapshot = ReportSnapshot::new(
            vec![],
            vec![GovernorStatusReport {
                guardian_id: GuardianId::new("g1"),
                node_name: String::new(),
                created_at: None,
                updated_at: None,
                chains: vec![
                    StatusChainEntry {
                        chain_id: json!(2),
                        available_notional: json!(10),
                        emitters: vec![EmitterEntry {
                            emitter_address: "e1".to_string(),
                            total_enqueued_vaas: json!(2),
                            enqueued_vaas: vec![
                                EnqueuedVaaEntry {
                                    sequence: json!("12"),
                                    release_time: json!(1_700_000_000),
                                    notional_value: json!(500),
                                    tx_hash: "0xabc".to_string(),
                                },
                                EnqueuedVaaEntry {
                                    sequence: json!("twelve"),
                                    release_time: json!(0),
                                    notional_value: json!(500),
                                    tx_hash: "0xdef".to_string(),
                                },
                            ],
                        }],
                    },
                    StatusChainEntry {
                        chain_id: json!(0),
                        available_notional: json!(10),
                        emitters: vec![EmitterEntry {
                            emitter_address: "e2".to_string(),
                            total_enqueued_vaas: json!(1),
                            enqueued_vaas: vec![EnqueuedVaaEntry::default()],
                        }],
                    },
                ],
            }],
        );

        let mut stats = ExtractionStats::default();
        let records = collect_enqueued(&snapshot, &mut stats);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, 12);
        assert_eq!(records[0].chain_id, 2);
        assert_eq!(
            records[0].release_time.map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
        assert_eq!(stats.total_skipped(), 2);
    }
}
