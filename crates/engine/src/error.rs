//! Contribution errors
//!
//! Business rejections are not errors; they come back as a `Decision` in
//! the receipt. These are input errors and infrastructure failures.

use campaign_core::MoneyError;
use campaign_eligibility::EligibilityError;
use campaign_ledger::LedgerError;
use strum_macros::Display;
use thiserror::Error;

/// External collaborator the engine depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Collaborator {
    #[strum(serialize = "KYC store")]
    KycStore,
    #[strum(serialize = "ledger")]
    Ledger,
    #[strum(serialize = "price oracle")]
    PriceOracle,
}

/// Errors from contribution processing
#[derive(Debug, Error)]
pub enum ContributionError {
    #[error("{collaborator} unavailable: {detail}")]
    LookupUnavailable {
        collaborator: Collaborator,
        detail: String,
    },

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),

    #[error("Ledger invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),

    #[error("Eligibility input error: {0}")]
    Eligibility(#[from] EligibilityError),

    #[error("Contributions are paused")]
    Paused,

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<ContributionError>,
    },

    #[error("Contribution task failed: {0}")]
    TaskFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, ContributionError>;

impl ContributionError {
    pub fn unavailable(collaborator: Collaborator, detail: impl Into<String>) -> Self {
        ContributionError::LookupUnavailable {
            collaborator,
            detail: detail.into(),
        }
    }

    /// Transient failures; the engine retries the whole attempt on these
    pub fn is_retryable(&self) -> bool {
        match self {
            ContributionError::LookupUnavailable { .. } => true,
            ContributionError::Ledger(e) => e.is_transient(),
            _ => false,
        }
    }

    /// The last underlying error, unwrapping `RetriesExhausted`
    pub fn root_cause(&self) -> &ContributionError {
        match self {
            ContributionError::RetriesExhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }
}

impl From<LedgerError> for ContributionError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvariantViolation { .. } => {
                ContributionError::InvariantViolation(e.to_string())
            }
            other => ContributionError::Ledger(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::DonorId;

    #[test]
    fn test_retry_classification() {
        assert!(ContributionError::unavailable(Collaborator::KycStore, "timeout").is_retryable());
        assert!(ContributionError::Ledger(LedgerError::Unavailable("down".into())).is_retryable());
        assert!(!ContributionError::Ledger(LedgerError::Poisoned).is_retryable());
        let io = std::io::Error::other("disk full");
        assert!(ContributionError::from(LedgerError::from(io)).is_retryable());
        assert!(!ContributionError::Ledger(LedgerError::JournalPoisoned("x".into())).is_retryable());
        assert!(!ContributionError::Paused.is_retryable());
        assert!(!ContributionError::InvariantViolation("x".into()).is_retryable());
    }

    #[test]
    fn test_invariant_violation_mapped() {
        let err: ContributionError = LedgerError::InvariantViolation {
            donor: DonorId::new("alice").unwrap(),
            cumulative: "$3000.00".into(),
            attempted: "$500.00".into(),
            limit: "$3300.00".into(),
        }
        .into();
        assert!(matches!(err, ContributionError::InvariantViolation(_)));
    }

    #[test]
    fn test_root_cause() {
        let err = ContributionError::RetriesExhausted {
            attempts: 3,
            last: Box::new(ContributionError::unavailable(Collaborator::Ledger, "timeout")),
        };
        assert!(matches!(
            err.root_cause(),
            ContributionError::LookupUnavailable {
                collaborator: Collaborator::Ledger,
                ..
            }
        ));
        assert!(err.to_string().contains("ledger unavailable"));
    }
}
