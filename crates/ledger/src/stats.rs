//! Campaign-wide ledger statistics

use campaign_core::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Aggregate view over all records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_raised: Money,
    /// Donors with at least one accepted contribution
    pub unique_contributors: usize,
    pub accepted_count: u64,
    pub rejected_count: u64,
}

impl Default for LedgerStats {
    fn default() -> Self {
        Self {
            total_raised: Money::zero(Currency::Usd),
            unique_contributors: 0,
            accepted_count: 0,
            rejected_count: 0,
        }
    }
}

impl LedgerStats {
    pub fn record_count(&self) -> u64 {
        self.accepted_count + self.rejected_count
    }

    /// Mean accepted contribution, truncated to whole cents
    pub fn average_contribution(&self) -> Money {
        if self.accepted_count == 0 {
            return Money::zero(self.total_raised.currency());
        }
        Money::usd_cents(self.total_raised.minor_units() / self.accepted_count)
    }
}
