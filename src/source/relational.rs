//! Relational (Postgres) report source
//!
//! Reports are stored one row per guardian with a child table holding one
//! row per chain entry. Emitters of a status chain entry are kept as JSONB.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{debug, warn};

use super::GuardianReportSource;
use crate::error::Result;
use crate::governor::{
    ChainFilter, ConfigChainEntry, EmitterEntry, GovernorConfigReport, GovernorStatusReport,
    GuardianId, StatusChainEntry,
};

const CONFIG_QUERY: &str = r#"
    SELECT
      c.id, c.guardian_name, c.counter, c.created_at, c.updated_at,
      cc.chain_id, cc.notional_limit, cc.big_transaction_size
    FROM wormholescan.wh_governor_config c
    LEFT JOIN wormholescan.wh_governor_config_chains cc
      ON cc.governor_config_id = c.id
     AND ($1::INT IS NULL OR cc.chain_id = $1)
    ORDER BY c.id, cc.chain_id
"#;

const STATUS_QUERY: &str = r#"
    SELECT
      s.id, s.guardian_name, s.created_at, s.updated_at,
      sc.chain_id, sc.available_notional, sc.emitters
    FROM wormholescan.wh_governor_status s
    LEFT JOIN wormholescan.wh_governor_status_chains sc
      ON sc.governor_status_id = s.id
     AND ($1::INT IS NULL OR sc.chain_id = $1)
    ORDER BY s.id, sc.chain_id
"#;

/// One joined row of the config tables
#[derive(Clone, Debug, Default)]
pub struct ConfigRow {
    pub id: String,
    pub guardian_name: Option<String>,
    pub counter: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub chain_id: Option<i32>,
    pub notional_limit: Option<i64>,
    pub big_transaction_size: Option<i64>,
}

/// One joined row of the status tables
#[derive(Clone, Debug, Default)]
pub struct StatusRow {
    pub id: String,
    pub guardian_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub chain_id: Option<i32>,
    pub available_notional: Option<i64>,
    pub emitters: Option<Value>,
}

impl ConfigRow {
    fn from_row(row: &PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            guardian_name: row.try_get("guardian_name")?,
            counter: row.try_get("counter")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            chain_id: row.try_get("chain_id")?,
            notional_limit: row.try_get("notional_limit")?,
            big_transaction_size: row.try_get("big_transaction_size")?,
        })
    }
}

impl StatusRow {
    fn from_row(row: &PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            guardian_name: row.try_get("guardian_name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            chain_id: row.try_get("chain_id")?,
            available_notional: row.try_get("available_notional")?,
            emitters: row.try_get("emitters")?,
        })
    }
}

fn optional_number<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}

/// Fold rows ordered by guardian into one report per guardian
///
/// A row with a null chain id is a guardian without chain entries.
pub fn group_config_rows(rows: Vec<ConfigRow>) -> Vec<GovernorConfigReport> {
    let mut reports: Vec<GovernorConfigReport> = Vec::new();

    for row in rows {
        let guardian_id = GuardianId::new(&row.id);
        if reports.last().map(|r| &r.guardian_id) != Some(&guardian_id) {
            reports.push(GovernorConfigReport {
                guardian_id,
                node_name: row.guardian_name.clone().unwrap_or_default(),
                counter: row.counter.unwrap_or_default(),
                created_at: row.created_at,
                updated_at: row.updated_at,
                chains: Vec::new(),
            });
        }

        if let (Some(chain_id), Some(report)) = (row.chain_id, reports.last_mut()) {
            report.chains.push(ConfigChainEntry {
                chain_id: json!(chain_id),
                notional_limit: optional_number(row.notional_limit),
                max_transaction_size: optional_number(row.big_transaction_size),
            });
        }
    }

    reports
}

/// Status counterpart of [`group_config_rows`]
///
/// Emitters that do not decode are dropped for that chain entry only.
pub fn group_status_rows(rows: Vec<StatusRow>) -> Vec<GovernorStatusReport> {
    let mut reports: Vec<GovernorStatusReport> = Vec::new();

    for row in rows {
        let guardian_id = GuardianId::new(&row.id);
        if reports.last().map(|r| &r.guardian_id) != Some(&guardian_id) {
            reports.push(GovernorStatusReport {
                guardian_id,
                node_name: row.guardian_name.clone().unwrap_or_default(),
                created_at: row.created_at,
                updated_at: row.updated_at,
                chains: Vec::new(),
            });
        }

        let Some(chain_id) = row.chain_id else {
            continue;
        };

        let emitters = match row.emitters {
            Some(raw) => serde_json::from_value::<Vec<EmitterEntry>>(raw).unwrap_or_else(|e| {
                warn!(
                    "Dropping undecodable emitters for guardian {} chain {}: {}",
                    row.id, chain_id, e
                );
                Vec::new()
            }),
            None => Vec::new(),
        };

        if let Some(report) = reports.last_mut() {
            report.chains.push(StatusChainEntry {
                chain_id: json!(chain_id),
                available_notional: optional_number(row.available_notional),
                emitters,
            });
        }
    }

    reports
}

/// Report source over the relational store
pub struct RelationalReportSource {
    pool: PgPool,
}

impl RelationalReportSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool lazily; the first fetch opens the connection
    pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(database_url)?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl GuardianReportSource for RelationalReportSource {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn fetch_config_reports(&self, filter: &ChainFilter) -> Result<Vec<GovernorConfigReport>> {
        let rows: Vec<PgRow> = sqlx::query(CONFIG_QUERY)
            .bind(filter.chain_id().map(i32::from))
            .fetch_all(&self.pool)
            .await?;
        debug!("Fetched {} governor config rows", rows.len());

        let rows = rows
            .iter()
            .map(ConfigRow::from_row)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(group_config_rows(rows))
    }

    async fn fetch_status_reports(&self, filter: &ChainFilter) -> Result<Vec<GovernorStatusReport>> {
        let rows: Vec<PgRow> = sqlx::query(STATUS_QUERY)
            .bind(filter.chain_id().map(i32::from))
            .fetch_all(&self.pool)
            .await?;
        debug!("Fetched {} governor status rows", rows.len());

        let rows = rows
            .iter()
            .map(StatusRow::from_row)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(group_status_rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::{extract_samples, Metric, ReportSnapshot};

    fn config_row(id: &str, chain_id: Option<i32>, limit: Option<i64>) -> ConfigRow {
        ConfigRow {
            id: id.to_string(),
            guardian_name: Some(format!("{id}-name")),
            counter: Some(3),
            chain_id,
            notional_limit: limit,
            big_transaction_size: Some(10),
            ..Default::default()
        }
    }

    #[test]
    fn test_group_config_rows() {
        let reports = group_config_rows(vec![
            config_row("aa", Some(1), Some(100)),
            config_row("aa", Some(2), Some(200)),
            config_row("bb", None, None),
        ]);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].chains.len(), 2);
        assert_eq!(reports[0].node_name, "aa-name");
        assert!(reports[1].chains.is_empty());
    }

    #[test]
    fn test_negative_bigint_is_skipped_downstream() {
        let reports = group_config_rows(vec![config_row("aa", Some(1), Some(-1))]);
        let samples = extract_samples(&ReportSnapshot::new(reports, vec![]));
        assert!(samples.values(1, Metric::NotionalLimit).is_empty());
        assert_eq!(samples.values(1, Metric::MaxTransactionSize), vec![10]);
    }

    #[test]
    fn test_group_status_rows_decodes_emitters() {
        let reports = group_status_rows(vec![
            StatusRow {
                id: "aa".to_string(),
                chain_id: Some(2),
                available_notional: Some(1000),
                emitters: Some(json!([{
                    "emitterAddress": "0xe1",
                    "totalEnqueuedVaas": 1,
                    "enqueuedVaas": [{"sequence": 5, "releaseTime": 1700000000, "notionalValue": 9, "txHash": "0x1"}]
                }])),
                ..Default::default()
            },
            StatusRow {
                id: "aa".to_string(),
                chain_id: Some(4),
                available_notional: Some(50),
                emitters: Some(json!({"not": "a list"})),
                ..Default::default()
            },
        ]);

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].chains[0].emitters[0].enqueued_vaas.len(), 1);
        assert!(reports[0].chains[1].emitters.is_empty());
    }
}
