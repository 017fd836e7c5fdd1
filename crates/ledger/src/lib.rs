//! Campaign Ledger - append-only contribution records
//!
//! Every contribution attempt becomes exactly one [`ContributionRecord`],
//! accepted or rejected. A donor's cumulative total is the sum of their
//! accepted records and is only ever changed by an append.
//!
//! Per-donor atomicity comes from [`DonorLock`]: read the cumulative total,
//! evaluate, and append while holding the donor's lock.

pub mod error;
pub mod hash;
pub mod journal;
pub mod lock;
pub mod memory;
pub mod reader;
pub mod record;
mod state;
pub mod stats;
pub mod traits;

pub use error::{LedgerError, LedgerResult};
pub use hash::{calculate_record_hash, verify_chain, ChainError, GENESIS};
pub use journal::{JournalLedger, JournalWriter};
pub use lock::{DonorLock, DonorLocks};
pub use memory::InMemoryLedger;
pub use reader::RecordReader;
pub use record::{ContributionRecord, NewRecord, RecordOutcome};
pub use state::recompute_totals;
pub use stats::LedgerStats;
pub use traits::ContributionLedger;
