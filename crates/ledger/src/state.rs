//! In-memory ledger state shared by every ledger implementation
//!
//! Records are prepared (sequenced, hashed, checked against the cumulative
//! limit) first and only committed once the caller has made them durable.

use std::collections::HashMap;

use campaign_core::{Currency, DonorId, Money};
use chrono::Utc;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::hash::{calculate_record_hash, GENESIS};
use crate::record::{ContributionRecord, NewRecord};
use crate::stats::LedgerStats;

#[derive(Debug)]
pub(crate) struct LedgerState {
    max_cumulative: Money,
    records: Vec<ContributionRecord>,
    totals: HashMap<DonorId, Money>,
    total_raised: Money,
    accepted_count: u64,
    rejected_count: u64,
    last_hash: String,
}

impl LedgerState {
    pub(crate) fn new(max_cumulative: Money) -> Self {
        Self {
            max_cumulative,
            records: Vec::new(),
            totals: HashMap::new(),
            total_raised: Money::zero(Currency::Usd),
            accepted_count: 0,
            rejected_count: 0,
            last_hash: GENESIS.to_string(),
        }
    }

    pub(crate) fn cumulative(&self, donor: &DonorId) -> Money {
        self.totals
            .get(donor)
            .copied()
            .unwrap_or(Money::zero(Currency::Usd))
    }

    /// Build the next record without changing state
    pub(crate) fn prepare(&self, new: NewRecord) -> LedgerResult<ContributionRecord> {
        if new.outcome.is_accepted() {
            let cumulative = self.cumulative(&new.donor);
            let exceeds = match cumulative.checked_add(&new.amount_usd) {
                Ok(total) => total.compare(&self.max_cumulative)?.is_gt(),
                Err(campaign_core::MoneyError::Overflow(_)) => true,
                Err(e) => return Err(e.into()),
            };
            if exceeds {
                tracing::error!(
                    donor = %new.donor,
                    cumulative = %cumulative,
                    attempted = %new.amount_usd,
                    limit = %self.max_cumulative,
                    "Refusing accepted record above cumulative limit"
                );
                return Err(LedgerError::InvariantViolation {
                    donor: new.donor,
                    cumulative: cumulative.to_string(),
                    attempted: new.amount_usd.to_string(),
                    limit: self.max_cumulative.to_string(),
                });
            }
        }

        let mut record = ContributionRecord {
            id: Uuid::new_v4(),
            sequence: self.records.len() as u64 + 1,
            donor: new.donor,
            amount_usd: new.amount_usd,
            amount_native: new.amount_native,
            timestamp: Utc::now(),
            outcome: new.outcome,
            message: new.message,
            correlation_id: new.correlation_id,
            prev_hash: self.last_hash.clone(),
            hash: String::new(),
        };
        record.hash = calculate_record_hash(&record);
        Ok(record)
    }

    /// Apply a durable record
    pub(crate) fn commit(&mut self, record: ContributionRecord) -> LedgerResult<()> {
        if record.is_accepted() {
            let total = self.cumulative(&record.donor).checked_add(&record.amount_usd)?;
            self.totals.insert(record.donor.clone(), total);
            self.total_raised = self.total_raised.checked_add(&record.amount_usd)?;
            self.accepted_count += 1;
        } else {
            self.rejected_count += 1;
        }
        self.last_hash = record.hash.clone();
        self.records.push(record);
        Ok(())
    }

    pub(crate) fn records(&self) -> &[ContributionRecord] {
        &self.records
    }

    pub(crate) fn records_for(&self, donor: &DonorId) -> Vec<ContributionRecord> {
        self.records
            .iter()
            .filter(|r| &r.donor == donor)
            .cloned()
            .collect()
    }

    pub(crate) fn stats(&self) -> LedgerStats {
        LedgerStats {
            total_raised: self.total_raised,
            unique_contributors: self.totals.len(),
            accepted_count: self.accepted_count,
            rejected_count: self.rejected_count,
        }
    }

    /// Compare incremental totals with a full recomputation from records
    pub(crate) fn verify_totals(&self) -> LedgerResult<()> {
        let recomputed = recompute_totals(&self.records)?;
        let diverged = recomputed
            .keys()
            .chain(self.totals.keys())
            .find(|donor| recomputed.get(*donor) != self.totals.get(*donor));
        if let Some(donor) = diverged {
            return Err(LedgerError::TotalsDiverged(donor.clone()));
        }
        Ok(())
    }
}

/// Sum accepted amounts per donor from scratch
pub fn recompute_totals(records: &[ContributionRecord]) -> LedgerResult<HashMap<DonorId, Money>> {
    let mut totals: HashMap<DonorId, Money> = HashMap::new();
    for record in records.iter().filter(|r| r.is_accepted()) {
        let entry = totals
            .entry(record.donor.clone())
            .or_insert(Money::zero(Currency::Usd));
        *entry = entry.checked_add(&record.amount_usd)?;
    }
    Ok(totals)
}
