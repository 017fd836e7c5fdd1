//! In-memory ledger

use std::sync::RwLock;

use async_trait::async_trait;
use campaign_core::{DonorId, Money};
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::lock::{DonorLock, DonorLocks};
use crate::record::{ContributionRecord, NewRecord};
use crate::state::LedgerState;
use crate::stats::LedgerStats;
use crate::traits::ContributionLedger;

/// Ledger that keeps all records in memory
pub struct InMemoryLedger {
    id: Uuid,
    locks: DonorLocks,
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    /// Create an empty ledger enforcing `max_cumulative` per donor
    pub fn new(max_cumulative: Money) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            locks: DonorLocks::new(id),
            state: RwLock::new(LedgerState::new(max_cumulative)),
        }
    }

    /// Check incremental totals against a recomputation from records
    pub fn verify_totals(&self) -> LedgerResult<()> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        state.verify_totals()
    }
}

#[async_trait]
impl ContributionLedger for InMemoryLedger {
    async fn lock_donor(&self, donor: &DonorId) -> LedgerResult<DonorLock> {
        self.locks.acquire(donor).await
    }

    async fn cumulative_accepted(&self, donor: &DonorId) -> LedgerResult<Money> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.cumulative(donor))
    }

    async fn append(
        &self,
        lock: &DonorLock,
        record: NewRecord,
    ) -> LedgerResult<ContributionRecord> {
        lock.ensure_holds(self.id, &record.donor)?;

        let mut state = self.state.write().map_err(|_| LedgerError::Poisoned)?;
        let record = state.prepare(record)?;
        state.commit(record.clone())?;

        tracing::debug!(
            sequence = record.sequence,
            donor = %record.donor,
            accepted = record.is_accepted(),
            "Record appended"
        );
        Ok(record)
    }

    async fn records_for(&self, donor: &DonorId) -> LedgerResult<Vec<ContributionRecord>> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.records_for(donor))
    }

    async fn records(&self) -> LedgerResult<Vec<ContributionRecord>> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.records().to_vec())
    }

    async fn stats(&self) -> LedgerResult<LedgerStats> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::verify_chain;

    fn donor(id: &str) -> DonorId {
        DonorId::new(id).unwrap()
    }

    fn usd(s: &str) -> Money {
        Money::usd(s).unwrap()
    }

    #[tokio::test]
    async fn test_append_and_cumulative() {
        let ledger = InMemoryLedger::new(usd("3300"));
        let alice = donor("alice");

        let lock = ledger.lock_donor(&alice).await.unwrap();
        ledger
            .append(&lock, NewRecord::accepted(alice.clone(), usd("1000"), "c1"))
            .await
            .unwrap();
        ledger
            .append(&lock, NewRecord::accepted(alice.clone(), usd("250"), "c2"))
            .await
            .unwrap();
        drop(lock);

        assert_eq!(ledger.cumulative_accepted(&alice).await.unwrap(), usd("1250"));
        assert!(ledger.cumulative_accepted(&donor("bob")).await.unwrap().is_zero());
        assert_eq!(ledger.records_for(&alice).await.unwrap().len(), 2);
        ledger.verify_totals().unwrap();
    }

    #[tokio::test]
    async fn test_lock_for_other_donor_refused() {
        let ledger = InMemoryLedger::new(usd("3300"));
        let lock = ledger.lock_donor(&donor("alice")).await.unwrap();

        let result = ledger
            .append(&lock, NewRecord::accepted(donor("bob"), usd("10"), "c1"))
            .await;
        assert!(matches!(result, Err(LedgerError::LockMismatch { .. })));
        assert!(ledger.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lock_from_other_ledger_refused() {
        let ledger = InMemoryLedger::new(usd("3300"));
        let other = InMemoryLedger::new(usd("3300"));
        let foreign = other.lock_donor(&donor("alice")).await.unwrap();

        let result = ledger
            .append(&foreign, NewRecord::accepted(donor("alice"), usd("10"), "c1"))
            .await;
        assert!(matches!(result, Err(LedgerError::LockMismatch { .. })));
    }

    #[tokio::test]
    async fn test_chain_across_donors() {
        let ledger = InMemoryLedger::new(usd("3300"));
        for who in ["alice", "bob", "carol"] {
            let d = donor(who);
            let lock = ledger.lock_donor(&d).await.unwrap();
            ledger
                .append(&lock, NewRecord::accepted(d.clone(), usd("5"), who))
                .await
                .unwrap();
        }

        let records = ledger.records().await.unwrap();
        assert_eq!(records.len(), 3);
        assert!(verify_chain(&records).is_ok());

        let stats = ledger.stats().await.unwrap();
        assert_eq!(stats.unique_contributors, 3);
        assert_eq!(stats.total_raised, usd("15"));
    }
}
