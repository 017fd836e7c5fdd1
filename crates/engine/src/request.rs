//! Contribution requests and receipts

use campaign_core::{DonorId, Money, NativeAmount};
use campaign_eligibility::Decision;
use campaign_ledger::ContributionRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Amount as submitted by the donation form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionAmount {
    /// Already in US dollars
    Usd(Money),
    /// Crypto amount, converted once at the current oracle price
    Native(NativeAmount),
}

/// One contribution attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRequest {
    pub donor: DonorId,
    pub amount: ContributionAmount,
    /// Caller-supplied id for tracing; generated when absent
    #[serde(default)]
    pub correlation_id: Option<String>,
}

impl ContributionRequest {
    pub fn usd(donor: DonorId, amount: Money) -> Self {
        Self {
            donor,
            amount: ContributionAmount::Usd(amount),
            correlation_id: None,
        }
    }

    pub fn native(donor: DonorId, amount: NativeAmount) -> Self {
        Self {
            donor,
            amount: ContributionAmount::Native(amount),
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

/// Native-to-USD conversion applied to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    pub native: NativeAmount,
    pub price_usd: Decimal,
    /// Truncated to whole cents
    pub amount_usd: Money,
}

/// What the caller gets back once the attempt is recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionReceipt {
    pub record: ContributionRecord,
    pub decision: Decision,
    /// Donor's accepted total after this attempt; None when the attempt was
    /// rejected before the cumulative read
    pub cumulative_after: Option<Money>,
    pub conversion: Option<Conversion>,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

impl ContributionReceipt {
    pub fn is_accepted(&self) -> bool {
        self.decision.is_accepted()
    }

    pub fn correlation_id(&self) -> &str {
        &self.record.correlation_id
    }
}
