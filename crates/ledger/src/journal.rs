//! JSONL journal ledger
//!
//! One record per line. The file is the source of truth: on open every
//! record is read back, the hash chain verified, and the totals rebuilt.
//! A record is written and synced to disk before it affects
//! `cumulative_accepted`. A write that fails partway is cut back off the
//! file, so a retry appends after the last complete record.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use campaign_core::{DonorId, Money};
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::hash::verify_chain;
use crate::lock::{DonorLock, DonorLocks};
use crate::reader::RecordReader;
use crate::record::{ContributionRecord, NewRecord};
use crate::state::LedgerState;
use crate::stats::LedgerStats;
use crate::traits::ContributionLedger;

/// Append target for journal lines
pub trait JournalWriter: Write + Send {
    /// Current length in bytes
    fn byte_len(&self) -> io::Result<u64>;

    /// Cut the journal back to `len` bytes, durably
    fn truncate(&mut self, len: u64) -> io::Result<()>;

    /// Push written bytes to durable storage
    fn sync(&mut self) -> io::Result<()>;
}

impl JournalWriter for File {
    fn byte_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.sync_all()
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// File-backed, hash-chained contribution ledger
pub struct JournalLedger {
    id: Uuid,
    path: PathBuf,
    locks: DonorLocks,
    state: RwLock<LedgerState>,
    writer: Mutex<Box<dyn JournalWriter>>,
    poisoned: AtomicBool,
}

impl JournalLedger {
    /// Open (or create) a journal and replay it
    pub fn open(path: impl AsRef<Path>, max_cumulative: Money) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Self::with_writer(path, max_cumulative, Box::new(file))
    }

    /// Replay the journal at `path`, then append through `writer`
    ///
    /// `writer` must append to the same file.
    pub fn with_writer(
        path: impl AsRef<Path>,
        max_cumulative: Money,
        writer: Box<dyn JournalWriter>,
    ) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let records = RecordReader::new(&path).read_all()?;
        verify_chain(&records)?;

        let mut state = LedgerState::new(max_cumulative);
        let count = records.len();
        for record in records {
            state.commit(record)?;
        }
        state.verify_totals()?;

        tracing::info!(path = %path.display(), records = count, "Ledger journal opened");

        let id = Uuid::new_v4();
        Ok(Self {
            id,
            path,
            locks: DonorLocks::new(id),
            state: RwLock::new(state),
            writer: Mutex::new(writer),
            poisoned: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check incremental totals against a recomputation from records
    pub fn verify_totals(&self) -> LedgerResult<()> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        state.verify_totals()
    }

    /// True once a failed write could not be rolled back
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::SeqCst)
    }

    fn write_line(&self, record: &ContributionRecord) -> LedgerResult<()> {
        if self.is_poisoned() {
            return Err(LedgerError::JournalPoisoned(self.path.display().to_string()));
        }

        let json = serde_json::to_string(record)?;
        let mut writer = self.writer.lock().map_err(|_| LedgerError::Poisoned)?;
        let start = writer.byte_len()?;

        let Err(e) = write_synced(&mut **writer, &json) else {
            return Ok(());
        };

        match writer.truncate(start) {
            Ok(()) => {
                tracing::warn!(
                    sequence = record.sequence,
                    error = %e,
                    "Journal write failed, rolled back"
                );
                Err(e.into())
            }
            Err(rollback) => {
                self.poisoned.store(true, Ordering::SeqCst);
                tracing::error!(
                    path = %self.path.display(),
                    sequence = record.sequence,
                    error = %e,
                    rollback_error = %rollback,
                    "Journal rollback failed, refusing further appends"
                );
                Err(LedgerError::JournalPoisoned(format!(
                    "{}: {} (rollback: {})",
                    self.path.display(),
                    e,
                    rollback
                )))
            }
        }
    }
}

fn write_synced(writer: &mut dyn JournalWriter, json: &str) -> io::Result<()> {
    writeln!(writer, "{}", json)?;
    writer.flush()?;
    writer.sync()
}

#[async_trait]
impl ContributionLedger for JournalLedger {
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

        // Held across the write so file order matches sequence order
        let mut state = self.state.write().map_err(|_| LedgerError::Poisoned)?;
        let record = state.prepare(record)?;
        self.write_line(&record)?;
        state.commit(record.clone())?;

        tracing::debug!(
            sequence = record.sequence,
            donor = %record.donor,
            accepted = record.is_accepted(),
            "Record journaled"
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
