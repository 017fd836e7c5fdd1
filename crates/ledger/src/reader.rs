//! JSONL record reader - sequential reader for replay and verification

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::LedgerResult;
use crate::record::ContributionRecord;

/// Sequential reader over a ledger journal file
pub struct RecordReader {
    path: PathBuf,
}

impl RecordReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read all records in file order; a missing file has no records
    pub fn read_all(&self) -> LedgerResult<Vec<ContributionRecord>> {
        let mut records = Vec::new();
        if !self.path.exists() {
            return Ok(records);
        }

        let reader = BufReader::new(File::open(&self.path)?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: ContributionRecord = serde_json::from_str(&line)?;
            records.push(record);
        }

        Ok(records)
    }
}
