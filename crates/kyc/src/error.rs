//! KYC errors

use thiserror::Error;

/// Errors from the KYC store
#[derive(Debug, Error)]
pub enum KycError {
    #[error("Caller is not the registry owner: {0}")]
    NotOwner(String),

    #[error("Caller is not a KYC verifier: {0}")]
    NotAVerifier(String),

    #[error("KYC store unavailable: {0}")]
    Unavailable(String),

    #[error("KYC journal is malformed: {0}")]
    CorruptJournal(String),

    #[error("KYC registry state poisoned")]
    Poisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl KycError {
    /// Authorization failures are caller mistakes; everything else is infrastructure
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, KycError::NotOwner(_) | KycError::NotAVerifier(_))
    }
}

/// Result type for KYC operations
pub type KycResult<T> = Result<T, KycError>;
