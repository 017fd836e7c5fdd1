//! Contribution limits
//!
//! Both limits are independently configurable; they currently share the
//! $3,300 individual contribution limit.

use campaign_core::{Currency, Money};
use serde::{Deserialize, Serialize};

use crate::error::{EligibilityError, EligibilityResult};

/// $3,300.00
const DEFAULT_LIMIT_CENTS: u64 = 330_000;

/// Per-transaction and per-donor cumulative limits, both in USD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionLimits {
    /// Largest single accepted contribution
    #[serde(default = "default_max_per_transaction")]
    pub max_per_transaction_usd: Money,

    /// Largest sum of accepted contributions for one donor
    #[serde(default = "default_max_cumulative")]
    pub max_cumulative_usd: Money,
}

fn default_max_per_transaction() -> Money {
    Money::usd_cents(DEFAULT_LIMIT_CENTS)
}

fn default_max_cumulative() -> Money {
    Money::usd_cents(DEFAULT_LIMIT_CENTS)
}

impl Default for ContributionLimits {
    fn default() -> Self {
        Self {
            max_per_transaction_usd: default_max_per_transaction(),
            max_cumulative_usd: default_max_cumulative(),
        }
    }
}

impl ContributionLimits {
    /// Create limits, both of which must be USD
    pub fn new(max_per_transaction_usd: Money, max_cumulative_usd: Money) -> EligibilityResult<Self> {
        let limits = Self {
            max_per_transaction_usd,
            max_cumulative_usd,
        };
        limits.validate()?;
        Ok(limits)
    }

    /// Check that both limits are positive USD amounts
    pub fn validate(&self) -> EligibilityResult<()> {
        for (name, limit) in [
            ("max_per_transaction_usd", self.max_per_transaction_usd),
            ("max_cumulative_usd", self.max_cumulative_usd),
        ] {
            if limit.currency() != Currency::Usd {
                return Err(EligibilityError::InvalidLimits(format!(
                    "{} must be USD, got {}",
                    name,
                    limit.currency()
                )));
            }
            if limit.is_zero() {
                return Err(EligibilityError::InvalidLimits(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Load limits from a JSON file
    pub fn from_file(path: &std::path::Path) -> EligibilityResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let limits: Self = serde_json::from_str(&content)?;
        limits.validate()?;
        Ok(limits)
    }

    /// Capacity left for a donor who has already contributed `cumulative`
    pub fn remaining_capacity(&self, cumulative: Money) -> EligibilityResult<Money> {
        Ok(self.max_cumulative_usd.saturating_sub(&cumulative)?)
    }
}
