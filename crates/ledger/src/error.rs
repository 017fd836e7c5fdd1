//! Ledger errors

use campaign_core::{DonorId, MoneyError};
use thiserror::Error;

use crate::hash::ChainError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Donor lock mismatch: lock held for {held}, record is for {record}")]
    LockMismatch { held: String, record: String },

    #[error("Cumulative limit invariant violated for {donor}: {cumulative} + {attempted} > {limit}")]
    InvariantViolation {
        donor: DonorId,
        cumulative: String,
        attempted: String,
        limit: String,
    },

    #[error("Hash chain broken: {0}")]
    ChainBroken(#[from] ChainError),

    #[error("Totals diverge from records for {0}")]
    TotalsDiverged(DonorId),

    #[error("Amount error: {0}")]
    Money(#[from] MoneyError),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("Ledger state poisoned")]
    Poisoned,

    #[error("Journal unusable after a failed rollback: {0}")]
    JournalPoisoned(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    /// Failures a later attempt could get past
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_) | LedgerError::Io(_))
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
