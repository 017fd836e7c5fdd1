//! Offline audit replay
//!
//! Replays a historical contribution export through the same evaluator used
//! for live submissions, ordered by donor then date, tracking each donor's
//! accepted total as it goes. Produces an [`AuditReport`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use campaign_core::{Currency, DonorId, Money};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decision::{Decision, RejectionReason};
use crate::error::EligibilityResult;
use crate::evaluator::EligibilityEvaluator;

/// One row of a historical contribution export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalContribution {
    pub donor: DonorId,
    /// Raw USD amount; may be zero or negative in dirty exports
    pub amount_usd: Decimal,
    pub contributed_at: DateTime<Utc>,
    #[serde(default)]
    pub kyc_verified: bool,
}

/// A donor whose raw history sums above the cumulative limit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorExposure {
    pub donor: DonorId,
    pub raw_total_usd: Decimal,
    pub contribution_count: usize,
}

/// Result of replaying a contribution history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub total: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub rejections: BTreeMap<RejectionReason, usize>,
    /// Accepted total across all donors
    pub accepted_total_usd: Money,
    /// Donors with at least one contribution, split by KYC flag
    pub kyc_verified_donors: usize,
    pub kyc_unverified_donors: usize,
    /// Raw amounts above the per-transaction limit
    pub oversized_contributions: usize,
    /// Highest raw totals first
    pub donors_over_cumulative: Vec<DonorExposure>,
}

impl AuditReport {
    /// Whole-percent success rate (0 for an empty history)
    pub fn success_rate_pct(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.valid_count as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// Replay `history` through `evaluator`
///
/// Amounts that are zero or negative are counted as `NonPositiveAmount`
/// without constructing a `Money`; amounts with sub-cent precision are an
/// input error.
pub fn audit_history(
    evaluator: &EligibilityEvaluator,
    history: &[HistoricalContribution],
) -> EligibilityResult<AuditReport> {
    let mut ordered: Vec<&HistoricalContribution> = history.iter().collect();
    ordered.sort_by(|a, b| {
        a.donor
            .cmp(&b.donor)
            .then_with(|| a.contributed_at.cmp(&b.contributed_at))
    });

    let limits = evaluator.limits();
    let mut cumulative: HashMap<&DonorId, Money> = HashMap::new();
    let mut raw_totals: BTreeMap<&DonorId, (Decimal, usize)> = BTreeMap::new();
    let mut verified = BTreeSet::new();
    let mut unverified = BTreeSet::new();
    let mut rejections = BTreeMap::new();
    let mut valid_count = 0;
    let mut oversized_contributions = 0;
    let mut accepted_total_usd = Money::zero(Currency::Usd);

    for row in &ordered {
        let raw = raw_totals.entry(&row.donor).or_insert((Decimal::ZERO, 0));
        raw.0 += row.amount_usd;
        raw.1 += 1;

        if row.kyc_verified {
            verified.insert(&row.donor);
        } else {
            unverified.insert(&row.donor);
        }

        if row.amount_usd > limits.max_per_transaction_usd.to_decimal() {
            oversized_contributions += 1;
        }

        let amount = if row.amount_usd <= Decimal::ZERO {
            Money::zero(Currency::Usd)
        } else {
            Money::from_decimal(row.amount_usd, Currency::Usd)?
        };

        let so_far = cumulative
            .get(&row.donor)
            .copied()
            .unwrap_or(Money::zero(Currency::Usd));

        match evaluator.evaluate(&row.donor, amount, row.kyc_verified, so_far)? {
            Decision::Accepted => {
                valid_count += 1;
                cumulative.insert(&row.donor, so_far.checked_add(&amount)?);
                accepted_total_usd = accepted_total_usd.checked_add(&amount)?;
            }
            Decision::Rejected(rejection) => {
                *rejections.entry(rejection.reason).or_insert(0) += 1;
            }
        }
    }

    let cap = limits.max_cumulative_usd.to_decimal();
    let mut donors_over_cumulative: Vec<DonorExposure> = raw_totals
        .into_iter()
        .filter(|(_, (total, _))| *total > cap)
        .map(|(donor, (total, count))| DonorExposure {
            donor: donor.clone(),
            raw_total_usd: total,
            contribution_count: count,
        })
        .collect();
    donors_over_cumulative.sort_by(|a, b| b.raw_total_usd.cmp(&a.raw_total_usd));

    let report = AuditReport {
        total: ordered.len(),
        valid_count,
        invalid_count: ordered.len() - valid_count,
        rejections,
        accepted_total_usd,
        kyc_verified_donors: verified.len(),
        kyc_unverified_donors: unverified.len(),
        oversized_contributions,
        donors_over_cumulative,
    };

    tracing::info!(
        total = report.total,
        valid = report.valid_count,
        invalid = report.invalid_count,
        "Audit replay complete"
    );

    Ok(report)
}
