//! Projection errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] campaign_ledger::LedgerError),

    #[error("Amount error: {0}")]
    Money(#[from] campaign_core::MoneyError),

    #[error("Corrupt projection row: {0}")]
    Corrupt(String),
}
