//! Campaign Engine - contribution processing
//!
//! Wires the KYC lookup, the price oracle, the eligibility evaluator and the
//! contribution ledger into one serialized, retrying, cancellation-safe
//! submit path.
//!
//! ## Failure model
//!
//! - Business rejections are `Decision::Rejected` values in the receipt
//! - KYC or ledger lookups that time out are `LookupUnavailable`, never
//!   "unverified" or "zero"
//! - Transient failures retry the whole read-evaluate-append sequence
//! - A ledger invariant violation is surfaced, never retried

pub mod config;
pub mod engine;
pub mod error;
pub mod info;
pub mod request;

pub use config::EngineConfig;
pub use engine::ContributionEngine;
pub use error::{Collaborator, ContributionError, EngineResult};
pub use info::{CampaignStats, ContributorInfo};
pub use request::{ContributionAmount, ContributionReceipt, ContributionRequest, Conversion};
