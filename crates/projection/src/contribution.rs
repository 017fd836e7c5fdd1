//! Contribution projection - reporting tables built from ledger records
//!
//! Amounts are stored as integer cents so SQL sums stay exact.

use campaign_core::{Currency, DonorId, Money};
use campaign_ledger::ContributionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::error::ProjectionError;

/// One donor's row in `donor_totals`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorTotal {
    pub donor: DonorId,
    pub accepted_total: Money,
    pub accepted_count: i64,
    pub rejected_count: i64,
    pub last_contribution_at: DateTime<Utc>,
}

/// One row of `contributions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedContribution {
    pub sequence: i64,
    pub donor: DonorId,
    pub amount_usd: Money,
    pub status: String,
    pub reason: Option<String>,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Campaign-wide aggregates computed in SQL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionStats {
    pub total_raised: Money,
    pub unique_contributors: i64,
    pub accepted_count: i64,
    pub rejected_count: i64,
    /// Rejection reason code and count, most frequent first
    pub rejections: Vec<(String, i64)>,
}

/// Contribution projection
pub struct ContributionProjection {
    pool: SqlitePool,
}

impl ContributionProjection {
    /// Create a new contribution projection
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the schema
    pub async fn init(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS contributions (
                sequence INTEGER PRIMARY KEY,
                id TEXT NOT NULL,
                donor TEXT NOT NULL,
                amount_cents INTEGER NOT NULL,
                native_amount TEXT,
                native_asset TEXT,
                status TEXT NOT NULL,
                reason TEXT,
                correlation_id TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_contributions_donor
            ON contributions(donor, sequence)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS donor_totals (
                donor TEXT PRIMARY KEY,
                accepted_cents INTEGER NOT NULL DEFAULT 0,
                accepted_count INTEGER NOT NULL DEFAULT 0,
                rejected_count INTEGER NOT NULL DEFAULT 0,
                last_contribution_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply one record; records already projected are skipped
    pub async fn apply(&self, record: &ContributionRecord) -> Result<bool, ProjectionError> {
        let cents = to_i64(record.amount_usd.minor_units())?;
        let (status, reason) = match record.reason() {
            None => ("accepted", None),
            Some(reason) => ("rejected", Some(reason.to_string())),
        };
        let timestamp = record.timestamp.to_rfc3339();

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO contributions
                (sequence, id, donor, amount_cents, native_amount, native_asset, status, reason, correlation_id, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(to_i64(record.sequence)?)
        .bind(record.id.to_string())
        .bind(record.donor.as_str())
        .bind(cents)
        .bind(record.amount_native.map(|n| n.amount.to_string()))
        .bind(record.amount_native.map(|n| n.asset.code()))
        .bind(status)
        .bind(reason)
        .bind(&record.correlation_id)
        .bind(&timestamp)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if inserted {
            let (accepted_cents, accepted, rejected) = if record.is_accepted() {
                (cents, 1i64, 0i64)
            } else {
                (0, 0, 1)
            };

            sqlx::query(
                r#"
                INSERT INTO donor_totals (donor, accepted_cents, accepted_count, rejected_count, last_contribution_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(donor) DO UPDATE SET
                    accepted_cents = accepted_cents + excluded.accepted_cents,
                    accepted_count = accepted_count + excluded.accepted_count,
                    rejected_count = rejected_count + excluded.rejected_count,
                    last_contribution_at = excluded.last_contribution_at
                "#,
            )
            .bind(record.donor.as_str())
            .bind(accepted_cents)
            .bind(accepted)
            .bind(rejected)
            .bind(&timestamp)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Clear all projected data
    pub async fn clear(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM contributions")
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM donor_totals")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Totals per donor, largest accepted total first
    pub async fn donor_totals(&self) -> Result<Vec<DonorTotal>, ProjectionError> {
        let rows = sqlx::query(
            r#"
            SELECT donor, accepted_cents, accepted_count, rejected_count, last_contribution_at
            FROM donor_totals
            ORDER BY accepted_cents DESC, donor ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(DonorTotal {
                    donor: parse_donor(row.get("donor"))?,
                    accepted_total: cents_to_usd(row.get("accepted_cents"))?,
                    accepted_count: row.get("accepted_count"),
                    rejected_count: row.get("rejected_count"),
                    last_contribution_at: parse_timestamp(row.get("last_contribution_at"))?,
                })
            })
            .collect()
    }

    /// Projected history for one donor, oldest first
    pub async fn donor_history(
        &self,
        donor: &DonorId,
    ) -> Result<Vec<ProjectedContribution>, ProjectionError> {
        let rows = sqlx::query(
            r#"
            SELECT sequence, donor, amount_cents, status, reason, correlation_id, timestamp
            FROM contributions
            WHERE donor = ?
            ORDER BY sequence ASC
            "#,
        )
        .bind(donor.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ProjectedContribution {
                    sequence: row.get("sequence"),
                    donor: parse_donor(row.get("donor"))?,
                    amount_usd: cents_to_usd(row.get("amount_cents"))?,
                    status: row.get("status"),
                    reason: row.get("reason"),
                    correlation_id: row.get("correlation_id"),
                    timestamp: parse_timestamp(row.get("timestamp"))?,
                })
            })
            .collect()
    }

    /// Campaign-wide aggregates
    pub async fn stats(&self) -> Result<ProjectionStats, ProjectionError> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(accepted_cents), 0) AS total_cents,
                COALESCE(SUM(CASE WHEN accepted_count > 0 THEN 1 ELSE 0 END), 0) AS contributors,
                COALESCE(SUM(accepted_count), 0) AS accepted,
                COALESCE(SUM(rejected_count), 0) AS rejected
            FROM donor_totals
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let reason_rows = sqlx::query(
            r#"
            SELECT reason, COUNT(*) AS count
            FROM contributions
            WHERE status = 'rejected'
            GROUP BY reason
            ORDER BY count DESC, reason ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let rejections = reason_rows
            .iter()
            .map(|r| {
                let reason: Option<String> = r.get("reason");
                (reason.unwrap_or_default(), r.get::<i64, _>("count"))
            })
            .collect();

        Ok(ProjectionStats {
            total_raised: cents_to_usd(row.get("total_cents"))?,
            unique_contributors: row.get("contributors"),
            accepted_count: row.get("accepted"),
            rejected_count: row.get("rejected"),
            rejections,
        })
    }
}

fn to_i64(value: u64) -> Result<i64, ProjectionError> {
    i64::try_from(value).map_err(|_| ProjectionError::Corrupt(format!("{} exceeds i64", value)))
}

fn cents_to_usd(cents: i64) -> Result<Money, ProjectionError> {
    Ok(Money::from_minor_units(cents, Currency::Usd)?)
}

fn parse_donor(raw: String) -> Result<DonorId, ProjectionError> {
    DonorId::new(&raw).map_err(|e| ProjectionError::Corrupt(format!("donor '{}': {}", raw, e)))
}

fn parse_timestamp(raw: String) -> Result<DateTime<Utc>, ProjectionError> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ProjectionError::Corrupt(format!("timestamp '{}': {}", raw, e)))
}
