//! Per-donor serialization
//!
//! Each donor has one async mutex. The read-cumulative, evaluate and append
//! sequence for a donor runs while holding its [`DonorLock`]; different
//! donors never contend. A donor's slot is dropped from the table when the
//! last holder releases it and nobody is waiting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use campaign_core::DonorId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};

/// Exclusive hold on one donor's serialization slot
///
/// Owned and `Send`, so it can be held across `.await` points and moved
/// into a spawned task. Released on drop.
#[derive(Debug)]
pub struct DonorLock {
    donor: DonorId,
    ledger_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
    slots: Slots,
}

impl DonorLock {
    /// Check the lock was issued by `ledger_id` for `donor`
    pub fn ensure_holds(&self, ledger_id: Uuid, donor: &DonorId) -> LedgerResult<()> {
        if self.ledger_id != ledger_id || &self.donor != donor {
            return Err(LedgerError::LockMismatch {
                held: self.donor.to_string(),
                record: donor.to_string(),
            });
        }
        Ok(())
    }
}

impl Drop for DonorLock {
    fn drop(&mut self) {
        // Release first so the table holds the only other reference
        drop(self.guard.take());

        let Ok(mut slots) = self.slots.lock() else {
            return;
        };
        // Waiters clone the slot under this same mutex, so a count of one
        // means nobody else can reach it
        if slots
            .get(&self.donor)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.donor);
        }
    }
}

type Slots = Arc<Mutex<HashMap<DonorId, Arc<AsyncMutex<()>>>>>;

/// Table of per-donor locks for one ledger instance
#[derive(Debug)]
pub struct DonorLocks {
    ledger_id: Uuid,
    slots: Slots,
}

impl DonorLocks {
    pub fn new(ledger_id: Uuid) -> Self {
        Self {
            ledger_id,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Donors with a held or awaited lock
    pub fn active(&self) -> LedgerResult<usize> {
        let slots = self.slots.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(slots.len())
    }

    /// Wait for and take the donor's lock
    pub async fn acquire(&self, donor: &DonorId) -> LedgerResult<DonorLock> {
        let slot = {
            let mut slots = self.slots.lock().map_err(|_| LedgerError::Poisoned)?;
            slots.entry(donor.clone()).or_default().clone()
        };

        let guard = slot.lock_owned().await;
        Ok(DonorLock {
            donor: donor.clone(),
            ledger_id: self.ledger_id,
            guard: Some(guard),
            slots: self.slots.clone(),
        })
    }
}
