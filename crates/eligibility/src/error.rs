//! Eligibility errors
//!
//! These are input errors. Business rejections are `Decision` values.

use campaign_core::{Currency, MoneyError};
use thiserror::Error;

/// Errors from the eligibility evaluator
#[derive(Debug, Error)]
pub enum EligibilityError {
    #[error("Amount must be denominated in {expected}, got {actual}")]
    CurrencyMismatch { expected: Currency, actual: Currency },

    #[error("Invalid contribution limits: {0}")]
    InvalidLimits(String),

    #[error("Invalid amount: {0}")]
    Money(#[from] MoneyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for eligibility operations
pub type EligibilityResult<T> = Result<T, EligibilityError>;
