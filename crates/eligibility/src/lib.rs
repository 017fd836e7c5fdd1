//! Campaign Eligibility
//!
//! Decides whether a single contribution attempt is allowed, given the
//! donor's KYC status and cumulative accepted total.
//!
//! ## Key Components
//!
//! - [`config::ContributionLimits`] - Per-transaction and cumulative limits
//! - [`decision::Decision`] - `Accepted` or `Rejected` with a verbatim reason code
//! - [`evaluator::EligibilityEvaluator`] - Pure, ordered rule evaluation
//! - [`replay::audit_history`] - Offline replay of historical contributions

pub mod config;
pub mod decision;
pub mod error;
pub mod evaluator;
pub mod replay;

pub use config::ContributionLimits;
pub use decision::{Decision, Rejection, RejectionReason};
pub use error::{EligibilityError, EligibilityResult};
pub use evaluator::EligibilityEvaluator;
pub use replay::{audit_history, AuditReport, DonorExposure, HistoricalContribution};
