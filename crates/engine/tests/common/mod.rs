//! Shared fixtures and scripted collaborators

#![allow(dead_code)]

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use campaign_core::{DonorId, Money};
use campaign_engine::{ContributionEngine, EngineConfig};
use campaign_kyc::{KycError, KycLookup, KycRegistry, KycResult, KycStatus};
use campaign_ledger::{
    ContributionLedger, ContributionRecord, DonorLock, InMemoryLedger, JournalWriter, LedgerError,
    LedgerResult, LedgerStats, NewRecord,
};
use campaign_oracle::FixedPriceOracle;
use rust_decimal_macros::dec;

pub const OWNER: &str = "owner";

pub fn usd(s: &str) -> Money {
    Money::usd(s).unwrap()
}

pub fn donor(id: &str) -> DonorId {
    DonorId::new(id).unwrap()
}

/// Short timeouts and backoff so failure tests run fast
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        lookup_timeout_ms: 50,
        retry_backoff_ms: 1,
        ..EngineConfig::default()
    }
}

pub fn registry_with(verified: &[&str]) -> Arc<KycRegistry> {
    let registry = KycRegistry::in_memory(OWNER);
    for id in verified {
        registry.verify(OWNER, &donor(id)).unwrap();
    }
    Arc::new(registry)
}

pub fn oracle() -> Arc<FixedPriceOracle> {
    Arc::new(FixedPriceOracle::with_eth_price(dec!(3000)).unwrap())
}

pub fn engine(
    config: EngineConfig,
    kyc: Arc<dyn KycLookup>,
    ledger: Arc<dyn ContributionLedger>,
) -> ContributionEngine {
    ContributionEngine::new(config, kyc, ledger, oracle()).unwrap()
}

/// Engine over an in-memory ledger with the given donors verified
pub fn simple_engine(verified: &[&str]) -> (ContributionEngine, Arc<InMemoryLedger>) {
    let ledger = Arc::new(InMemoryLedger::new(usd("3300")));
    let engine = engine(fast_config(), registry_with(verified), ledger.clone());
    (engine, ledger)
}

/// KYC lookup that can be slowed down or made to fail
pub struct ScriptedKyc {
    inner: Arc<KycRegistry>,
    delay: Duration,
    failures_left: AtomicU32,
    calls: AtomicU32,
}

impl ScriptedKyc {
    pub fn new(inner: Arc<KycRegistry>) -> Self {
        Self {
            inner,
            delay: Duration::ZERO,
            failures_left: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(self, times: u32) -> Self {
        self.failures_left.store(times, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KycLookup for ScriptedKyc {
    async fn is_verified(&self, donor: &DonorId) -> KycResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if take_failure(&self.failures_left) {
            return Err(KycError::Unavailable("identity provider down".into()));
        }
        self.inner.is_verified(donor).await
    }

    async fn status(&self, donor: &DonorId) -> KycResult<Option<KycStatus>> {
        self.inner.status(donor).await
    }
}

/// Ledger wrapper with scripted delays, read failures and stale reads
pub struct ScriptedLedger {
    inner: InMemoryLedger,
    read_delay: Duration,
    append_delay: Duration,
    read_failures_left: AtomicU32,
    append_failures_left: AtomicU32,
    reports_zero: bool,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self {
            inner: InMemoryLedger::new(usd("3300")),
            read_delay: Duration::ZERO,
            append_delay: Duration::ZERO,
            read_failures_left: AtomicU32::new(0),
            append_failures_left: AtomicU32::new(0),
            reports_zero: false,
        }
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    pub fn with_append_delay(mut self, delay: Duration) -> Self {
        self.append_delay = delay;
        self
    }

    pub fn failing_reads(self, times: u32) -> Self {
        self.read_failures_left.store(times, Ordering::SeqCst);
        self
    }

    pub fn failing_appends(self, times: u32) -> Self {
        self.append_failures_left.store(times, Ordering::SeqCst);
        self
    }

    /// Always report a zero cumulative total, as a lagging replica would
    pub fn reporting_zero(mut self) -> Self {
        self.reports_zero = true;
        self
    }
}

#[async_trait]
impl ContributionLedger for ScriptedLedger {
    async fn lock_donor(&self, donor: &DonorId) -> LedgerResult<DonorLock> {
        self.inner.lock_donor(donor).await
    }

    async fn cumulative_accepted(&self, donor: &DonorId) -> LedgerResult<Money> {
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        if take_failure(&self.read_failures_left) {
            return Err(LedgerError::Unavailable("replica lagging".into()));
        }
        if self.reports_zero {
            return Ok(Money::ZERO_USD);
        }
        self.inner.cumulative_accepted(donor).await
    }

    async fn append(&self, lock: &DonorLock, record: NewRecord) -> LedgerResult<ContributionRecord> {
        if !self.append_delay.is_zero() {
            tokio::time::sleep(self.append_delay).await;
        }
        if take_failure(&self.append_failures_left) {
            return Err(LedgerError::Unavailable("write rejected".into()));
        }
        self.inner.append(lock, record).await
    }

    async fn records_for(&self, donor: &DonorId) -> LedgerResult<Vec<ContributionRecord>> {
        self.inner.records_for(donor).await
    }

    async fn records(&self) -> LedgerResult<Vec<ContributionRecord>> {
        self.inner.records().await
    }

    async fn stats(&self) -> LedgerResult<LedgerStats> {
        self.inner.stats().await
    }
}

/// Journal file whose next writes land half a line on disk and then fail,
/// as a full disk would
pub struct TearingWriter {
    file: File,
    torn_left: Arc<AtomicU32>,
    truncate_fails: bool,
}

impl TearingWriter {
    pub fn open(path: &Path, torn: u32) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            torn_left: Arc::new(AtomicU32::new(torn)),
            truncate_fails: false,
        })
    }

    pub fn failing_truncate(mut self) -> Self {
        self.truncate_fails = true;
        self
    }
}

impl Write for TearingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if take_failure(&self.torn_left) {
            self.file.write_all(&buf[..buf.len() / 2])?;
            return Err(io::Error::other("no space left on device"));
        }
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl JournalWriter for TearingWriter {
    fn byte_len(&self) -> io::Result<u64> {
        self.file.byte_len()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        if self.truncate_fails {
            return Err(io::Error::other("read-only file system"));
        }
        self.file.truncate(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync()
    }
}

fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
