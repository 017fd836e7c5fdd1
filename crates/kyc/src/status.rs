//! KYC status records and the events that change them

use campaign_core::DonorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verification status for a single donor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycStatus {
    pub donor: DonorId,
    pub verified: bool,
    /// When the donor was last verified (None if never, or revoked)
    pub verified_at: Option<DateTime<Utc>>,
    /// Verifier that made the last change
    pub updated_by: Option<String>,
}

impl KycStatus {
    /// Status for a donor the store has never seen
    pub fn unknown(donor: DonorId) -> Self {
        Self {
            donor,
            verified: false,
            verified_at: None,
            updated_by: None,
        }
    }
}

/// Append-only KYC journal events
///
/// The registry state is a fold over these events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KycEvent {
    /// First event of every journal; binds the registry to its owner
    OwnerSet {
        owner: String,
        timestamp: DateTime<Utc>,
    },
    VerifierAdded {
        verifier: String,
        added_by: String,
        timestamp: DateTime<Utc>,
    },
    VerifierRemoved {
        verifier: String,
        removed_by: String,
        timestamp: DateTime<Utc>,
    },
    StatusUpdated {
        donor: DonorId,
        verified: bool,
        updated_by: String,
        timestamp: DateTime<Utc>,
    },
}

impl KycEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            KycEvent::OwnerSet { timestamp, .. }
            | KycEvent::VerifierAdded { timestamp, .. }
            | KycEvent::VerifierRemoved { timestamp, .. }
            | KycEvent::StatusUpdated { timestamp, .. } => *timestamp,
        }
    }
}
