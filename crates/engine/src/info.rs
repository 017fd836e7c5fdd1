//! Read-only views for the donation UI and reporting

use campaign_core::{DonorId, Money};
use campaign_ledger::ContributionRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything the UI shows about one donor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorInfo {
    pub donor: DonorId,
    pub kyc_verified: bool,
    pub cumulative: Money,
    pub remaining_capacity: Money,
    /// Largest single contribution that would be accepted right now
    pub max_contribution_now: Money,
    pub has_contributed: bool,
    pub history: Vec<ContributionRecord>,
}

/// Campaign-wide totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStats {
    pub total_raised: Money,
    pub unique_contributors: usize,
    pub accepted_count: u64,
    pub rejected_count: u64,
    pub average_contribution: Money,
    pub max_per_transaction_usd: Money,
    pub max_cumulative_usd: Money,
    /// Current ETH/USD quote, if the oracle has a fresh one
    pub eth_price_usd: Option<Decimal>,
    pub paused: bool,
}
