//! Contribution records
//!
//! One record per contribution attempt, accepted or rejected. Records are
//! immutable once appended.

use campaign_core::{DonorId, Money, NativeAmount};
use campaign_eligibility::{Rejection, RejectionReason};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome stored on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordOutcome {
    Accepted,
    Rejected { reason: RejectionReason },
}

impl RecordOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RecordOutcome::Accepted)
    }
}

/// A record as submitted to [`crate::ContributionLedger::append`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub donor: DonorId,
    pub amount_usd: Money,
    pub amount_native: Option<NativeAmount>,
    pub outcome: RecordOutcome,
    pub message: Option<String>,
    pub correlation_id: String,
}

impl NewRecord {
    pub fn accepted(donor: DonorId, amount_usd: Money, correlation_id: impl Into<String>) -> Self {
        Self {
            donor,
            amount_usd,
            amount_native: None,
            outcome: RecordOutcome::Accepted,
            message: None,
            correlation_id: correlation_id.into(),
        }
    }

    pub fn rejected(
        donor: DonorId,
        amount_usd: Money,
        rejection: &Rejection,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            donor,
            amount_usd,
            amount_native: None,
            outcome: RecordOutcome::Rejected {
                reason: rejection.reason,
            },
            message: Some(rejection.message.clone()),
            correlation_id: correlation_id.into(),
        }
    }

    /// Attach the native asset amount actually received
    pub fn with_native(mut self, native: NativeAmount) -> Self {
        self.amount_native = Some(native);
        self
    }
}

/// An appended, hash-chained contribution record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub id: Uuid,
    /// Position in the ledger, starting at 1
    pub sequence: u64,
    pub donor: DonorId,
    pub amount_usd: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_native: Option<NativeAmount>,
    pub timestamp: DateTime<Utc>,
    pub outcome: RecordOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub correlation_id: String,
    pub prev_hash: String,
    pub hash: String,
}

impl ContributionRecord {
    pub fn is_accepted(&self) -> bool {
        self.outcome.is_accepted()
    }

    pub fn reason(&self) -> Option<RejectionReason> {
        match self.outcome {
            RecordOutcome::Accepted => None,
            RecordOutcome::Rejected { reason } => Some(reason),
        }
    }
}
