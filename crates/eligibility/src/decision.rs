//! Eligibility decisions
//!
//! A decision is a value, never an error. Reason codes serialize verbatim
//! (`"KycNotVerified"`, ...) because callers key UI messages off them.

use campaign_core::Money;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Why a contribution was rejected
///
/// Variants are listed in evaluation order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
pub enum RejectionReason {
    NonPositiveAmount,
    KycNotVerified,
    ExceedsPerTransactionLimit,
    ExceedsCumulativeLimit,
}

/// A rejected contribution, with what the donor needs to see
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: RejectionReason,
    pub message: String,
    /// `max_cumulative - cumulative_so_far`, saturating at zero.
    /// None when the rejection was decided before the cumulative read.
    pub remaining_capacity: Option<Money>,
}

impl Rejection {
    pub fn new(
        reason: RejectionReason,
        message: impl Into<String>,
        remaining_capacity: Option<Money>,
    ) -> Self {
        Self {
            reason,
            message: message.into(),
            remaining_capacity,
        }
    }
}

/// Outcome of evaluating one contribution attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    Accepted,
    Rejected(Rejection),
}

impl Decision {
    pub fn rejected(
        reason: RejectionReason,
        message: impl Into<String>,
        remaining_capacity: Option<Money>,
    ) -> Self {
        Decision::Rejected(Rejection::new(reason, message, remaining_capacity))
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Decision::Accepted)
    }

    pub fn reason(&self) -> Option<RejectionReason> {
        match self {
            Decision::Accepted => None,
            Decision::Rejected(rejection) => Some(rejection.reason),
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Decision::Accepted => None,
            Decision::Rejected(rejection) => Some(rejection),
        }
    }
}
