//! Hash chain utilities for ledger integrity

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::record::{ContributionRecord, RecordOutcome};

/// `prev_hash` of the first record
pub const GENESIS: &str = "GENESIS";

/// SHA256 of record content, excluding the `hash` field itself
pub fn calculate_record_hash(record: &ContributionRecord) -> String {
    let mut hasher = Sha256::new();

    hasher.update(record.sequence.to_le_bytes());
    hasher.update(record.prev_hash.as_bytes());
    hasher.update(record.id.as_bytes());
    hasher.update(record.timestamp.to_rfc3339().as_bytes());
    hasher.update(record.donor.as_str().as_bytes());
    hasher.update(record.amount_usd.minor_units().to_le_bytes());
    hasher.update(record.amount_usd.currency().code().as_bytes());

    if let Some(ref native) = record.amount_native {
        hasher.update(native.amount.to_string().as_bytes());
        hasher.update(native.asset.code().as_bytes());
    }

    match record.outcome {
        RecordOutcome::Accepted => hasher.update(b"accepted"),
        RecordOutcome::Rejected { reason } => {
            hasher.update(b"rejected");
            hasher.update(reason.to_string().as_bytes());
        }
    }

    if let Some(ref message) = record.message {
        hasher.update(message.as_bytes());
    }
    hasher.update(record.correlation_id.as_bytes());

    hex::encode(hasher.finalize())
}

/// Verify hash chain integrity
pub fn verify_chain(records: &[ContributionRecord]) -> Result<(), ChainError> {
    let mut prev_hash = GENESIS.to_string();

    for (i, record) in records.iter().enumerate() {
        let expected_sequence = i as u64 + 1;
        if record.sequence != expected_sequence {
            return Err(ChainError::InvalidSequence {
                expected: expected_sequence,
                actual: record.sequence,
            });
        }

        if record.prev_hash != prev_hash {
            return Err(ChainError::BrokenLink {
                sequence: record.sequence,
                expected: prev_hash,
                actual: record.prev_hash.clone(),
            });
        }

        let calculated = calculate_record_hash(record);
        if record.hash != calculated {
            return Err(ChainError::InvalidHash {
                sequence: record.sequence,
                expected: calculated,
                actual: record.hash.clone(),
            });
        }

        prev_hash = record.hash.clone();
    }

    Ok(())
}

/// Errors in hash chain verification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Broken link at seq {sequence}: expected prev_hash '{expected}', got '{actual}'")]
    BrokenLink {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid hash at seq {sequence}: expected '{expected}', got '{actual}'")]
    InvalidHash {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid sequence: expected {expected}, got {actual}")]
    InvalidSequence { expected: u64, actual: u64 },
}
