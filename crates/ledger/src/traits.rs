//! Contribution ledger trait

use async_trait::async_trait;
use campaign_core::{DonorId, Money};

use crate::error::LedgerResult;
use crate::lock::DonorLock;
use crate::record::{ContributionRecord, NewRecord};
use crate::stats::LedgerStats;

/// Append-only store of contribution records
///
/// Implementations can be:
/// - `InMemoryLedger`: tests and embedding
/// - `JournalLedger`: hash-chained JSONL file
///
/// # Atomicity
/// Callers take [`lock_donor`](Self::lock_donor) before reading
/// `cumulative_accepted` and keep the lock until `append` returns. `append`
/// refuses a lock held for a different donor and refuses an accepted record
/// that would push the donor above the cumulative limit.
#[async_trait]
pub trait ContributionLedger: Send + Sync {
    /// Take the donor's serialization slot, waiting if another attempt holds it
    async fn lock_donor(&self, donor: &DonorId) -> LedgerResult<DonorLock>;

    /// Sum of all accepted records for the donor (and only those)
    async fn cumulative_accepted(&self, donor: &DonorId) -> LedgerResult<Money>;

    /// Durably append a decided record
    async fn append(&self, lock: &DonorLock, record: NewRecord)
        -> LedgerResult<ContributionRecord>;

    /// All records for one donor, oldest first
    async fn records_for(&self, donor: &DonorId) -> LedgerResult<Vec<ContributionRecord>>;

    /// All records, in sequence order
    async fn records(&self) -> LedgerResult<Vec<ContributionRecord>>;

    /// Campaign-wide aggregates
    async fn stats(&self) -> LedgerResult<LedgerStats>;
}
