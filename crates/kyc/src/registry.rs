//! KYC Registry - verifier-managed donor verification
//!
//! The registry owner is the initial verifier and the only caller allowed to
//! add or remove verifiers. Verifiers mark donors verified or revoke them.
//! Every change is a [`KycEvent`]; with a journal path the events are
//! appended to a JSONL file and replayed on open. A journal starts with an
//! `OwnerSet` event and can only be reopened by that owner.

use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use campaign_core::DonorId;
use chrono::Utc;

use crate::error::{KycError, KycResult};
use crate::status::{KycEvent, KycStatus};
use crate::traits::KycLookup;

#[derive(Debug, Default)]
struct RegistryState {
    owner: Option<String>,
    statuses: HashMap<DonorId, KycStatus>,
    verifiers: HashSet<String>,
}

impl RegistryState {
    fn apply(&mut self, event: &KycEvent) {
        match event {
            KycEvent::OwnerSet { owner, .. } => {
                self.owner = Some(owner.clone());
                self.verifiers.insert(owner.clone());
            }
            KycEvent::VerifierAdded { verifier, .. } => {
                self.verifiers.insert(verifier.clone());
            }
            KycEvent::VerifierRemoved { verifier, .. } => {
                self.verifiers.remove(verifier);
            }
            KycEvent::StatusUpdated {
                donor,
                verified,
                updated_by,
                timestamp,
            } => {
                let status = KycStatus {
                    donor: donor.clone(),
                    verified: *verified,
                    verified_at: verified.then_some(*timestamp),
                    updated_by: Some(updated_by.clone()),
                };
                self.statuses.insert(donor.clone(), status);
            }
        }
    }
}

/// Verifier-managed KYC registry
pub struct KycRegistry {
    owner: String,
    state: RwLock<RegistryState>,
    journal: Option<Mutex<File>>,
    path: Option<PathBuf>,
}

impl KycRegistry {
    /// Create a registry that keeps its state in memory only
    pub fn in_memory(owner: impl Into<String>) -> Self {
        let owner = owner.into();
        let mut state = RegistryState::default();
        state.apply(&KycEvent::OwnerSet {
            owner: owner.clone(),
            timestamp: Utc::now(),
        });

        Self {
            owner,
            state: RwLock::new(state),
            journal: None,
            path: None,
        }
    }

    /// Open (or create) a journal-backed registry and replay its events
    ///
    /// A new journal records `owner` as its first event. An existing one
    /// refuses any other caller with [`KycError::NotOwner`].
    pub fn open(path: impl AsRef<Path>, owner: impl Into<String>) -> KycResult<Self> {
        let path = path.as_ref().to_path_buf();
        let owner = owner.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut state = RegistryState::default();
        let mut replayed = 0usize;
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let event: KycEvent = serde_json::from_str(&line)?;
                let is_owner_set = matches!(event, KycEvent::OwnerSet { .. });
                if is_owner_set != (replayed == 0) {
                    return Err(KycError::CorruptJournal(format!(
                        "{}: owner must be recorded exactly once, as the first event",
                        path.display()
                    )));
                }
                state.apply(&event);
                replayed += 1;
            }
        }

        if let Some(recorded) = state.owner.as_deref() {
            if recorded != owner {
                tracing::warn!(path = %path.display(), caller = %owner, "KYC journal belongs to another owner");
                return Err(KycError::NotOwner(owner));
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::debug!(path = %path.display(), events = replayed, "KYC registry replayed");

        let registry = Self {
            owner,
            state: RwLock::new(state),
            journal: Some(Mutex::new(file)),
            path: Some(path),
        };
        if replayed == 0 {
            registry.record(KycEvent::OwnerSet {
                owner: registry.owner.clone(),
                timestamp: Utc::now(),
            })?;
        }
        Ok(registry)
    }

    /// Registry owner
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Journal path, if persisted
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Check whether a caller holds the verifier role
    pub fn is_verifier(&self, who: &str) -> KycResult<bool> {
        let state = self.state.read().map_err(|_| KycError::Poisoned)?;
        Ok(state.verifiers.contains(who))
    }

    /// Grant the verifier role (owner only)
    pub fn add_verifier(&self, by: &str, verifier: &str) -> KycResult<()> {
        self.require_owner(by)?;
        self.record(KycEvent::VerifierAdded {
            verifier: verifier.to_string(),
            added_by: by.to_string(),
            timestamp: Utc::now(),
        })?;
        tracing::info!(verifier, by, "KYC verifier added");
        Ok(())
    }

    /// Revoke the verifier role (owner only)
    pub fn remove_verifier(&self, by: &str, verifier: &str) -> KycResult<()> {
        self.require_owner(by)?;
        self.record(KycEvent::VerifierRemoved {
            verifier: verifier.to_string(),
            removed_by: by.to_string(),
            timestamp: Utc::now(),
        })?;
        tracing::info!(verifier, by, "KYC verifier removed");
        Ok(())
    }

    /// Mark a donor as verified
    pub fn verify(&self, by: &str, donor: &DonorId) -> KycResult<KycStatus> {
        self.set_status(by, donor, true)
    }

    /// Revoke a donor's verification
    pub fn revoke(&self, by: &str, donor: &DonorId) -> KycResult<KycStatus> {
        self.set_status(by, donor, false)
    }

    /// Verify several donors at once; returns how many were updated
    ///
    /// The verifier check happens once, before any donor is touched.
    pub fn batch_verify(&self, by: &str, donors: &[DonorId]) -> KycResult<usize> {
        self.require_verifier(by)?;
        for donor in donors {
            self.set_status(by, donor, true)?;
        }
        Ok(donors.len())
    }

    /// All known statuses, ordered by donor
    pub fn statuses(&self) -> KycResult<Vec<KycStatus>> {
        let state = self.state.read().map_err(|_| KycError::Poisoned)?;
        let mut statuses: Vec<_> = state.statuses.values().cloned().collect();
        statuses.sort_by(|a, b| a.donor.cmp(&b.donor));
        Ok(statuses)
    }

    fn set_status(&self, by: &str, donor: &DonorId, verified: bool) -> KycResult<KycStatus> {
        self.require_verifier(by)?;
        let event = KycEvent::StatusUpdated {
            donor: donor.clone(),
            verified,
            updated_by: by.to_string(),
            timestamp: Utc::now(),
        };
        self.record(event)?;
        tracing::info!(donor = %donor, verified, by, "KYC status updated");

        let state = self.state.read().map_err(|_| KycError::Poisoned)?;
        state
            .statuses
            .get(donor)
            .cloned()
            .ok_or_else(|| KycError::Unavailable(format!("status for {} not recorded", donor)))
    }

    /// Persist then apply, under the state write lock so journal order
    /// matches application order.
    fn record(&self, event: KycEvent) -> KycResult<()> {
        let mut state = self.state.write().map_err(|_| KycError::Poisoned)?;

        if let Some(ref journal) = self.journal {
            let mut file = journal.lock().map_err(|_| KycError::Poisoned)?;
            let json = serde_json::to_string(&event)?;
            writeln!(file, "{}", json)?;
            file.flush()?;
            file.sync_data()?;
        }

        state.apply(&event);
        Ok(())
    }

    fn require_owner(&self, by: &str) -> KycResult<()> {
        if by != self.owner {
            return Err(KycError::NotOwner(by.to_string()));
        }
        Ok(())
    }

    fn require_verifier(&self, by: &str) -> KycResult<()> {
        if !self.is_verifier(by)? {
            return Err(KycError::NotAVerifier(by.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KycLookup for KycRegistry {
    async fn is_verified(&self, donor: &DonorId) -> KycResult<bool> {
        let state = self.state.read().map_err(|_| KycError::Poisoned)?;
        Ok(state.statuses.get(donor).is_some_and(|s| s.verified))
    }

    async fn status(&self, donor: &DonorId) -> KycResult<Option<KycStatus>> {
        let state = self.state.read().map_err(|_| KycError::Poisoned)?;
        Ok(state.statuses.get(donor).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn donor(id: &str) -> DonorId {
        DonorId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_donor_not_verified() {
        let registry = KycRegistry::in_memory("owner");
        assert!(!registry.is_verified(&donor("alice")).await.unwrap());
        assert!(registry.status(&donor("alice")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_owner_is_initial_verifier() {
        let registry = KycRegistry::in_memory("owner");
        assert!(registry.is_verifier("owner").unwrap());

        let status = registry.verify("owner", &donor("alice")).unwrap();
        assert!(status.verified);
        assert!(status.verified_at.is_some());
        assert!(registry.is_verified(&donor("alice")).await.unwrap());
    }

    #[test]
    fn test_non_verifier_cannot_verify() {
        let registry = KycRegistry::in_memory("owner");
        let result = registry.verify("mallory", &donor("alice"));
        assert!(matches!(result, Err(KycError::NotAVerifier(_))));
    }

    #[test]
    fn test_only_owner_manages_verifiers() {
        let registry = KycRegistry::in_memory("owner");
        assert!(matches!(
            registry.add_verifier("mallory", "mallory"),
            Err(KycError::NotOwner(_))
        ));

        registry.add_verifier("owner", "verifier-1").unwrap();
        assert!(registry.is_verifier("verifier-1").unwrap());
        registry.verify("verifier-1", &donor("alice")).unwrap();

        registry.remove_verifier("owner", "verifier-1").unwrap();
        assert!(!registry.is_verifier("verifier-1").unwrap());
        assert!(registry.verify("verifier-1", &donor("bob")).is_err());
    }

    #[tokio::test]
    async fn test_revoke() {
        let registry = KycRegistry::in_memory("owner");
        registry.verify("owner", &donor("alice")).unwrap();
        let status = registry.revoke("owner", &donor("alice")).unwrap();

        assert!(!status.verified);
        assert!(status.verified_at.is_none());
        assert!(!registry.is_verified(&donor("alice")).await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_verify() {
        let registry = KycRegistry::in_memory("owner");
        let donors = vec![donor("alice"), donor("bob")];

        assert_eq!(registry.batch_verify("owner", &donors).unwrap(), 2);
        assert!(registry.is_verified(&donor("alice")).await.unwrap());
        assert!(registry.is_verified(&donor("bob")).await.unwrap());

        assert!(registry.batch_verify("mallory", &donors).is_err());
    }

    #[tokio::test]
    async fn test_journal_replay() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kyc").join("kyc.jsonl");

        {
            let registry = KycRegistry::open(&path, "owner").unwrap();
            registry.add_verifier("owner", "verifier-1").unwrap();
            registry.verify("verifier-1", &donor("alice")).unwrap();
            registry.verify("owner", &donor("bob")).unwrap();
            registry.revoke("owner", &donor("bob")).unwrap();
        }

        let registry = KycRegistry::open(&path, "owner").unwrap();
        assert!(registry.is_verifier("verifier-1").unwrap());
        assert!(registry.is_verified(&donor("alice")).await.unwrap());
        assert!(!registry.is_verified(&donor("bob")).await.unwrap());
        assert_eq!(registry.statuses().unwrap().len(), 2);
    }

    #[test]
    fn test_owner_fixed_by_journal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kyc.jsonl");

        {
            let registry = KycRegistry::open(&path, "owner").unwrap();
            registry.add_verifier("owner", "verifier-1").unwrap();
        }

        let result = KycRegistry::open(&path, "mallory");
        assert!(matches!(result, Err(KycError::NotOwner(ref who)) if who == "mallory"));

        let registry = KycRegistry::open(&path, "owner").unwrap();
        assert!(registry.is_verifier("owner").unwrap());
        assert!(!registry.is_verifier("mallory").unwrap());
        assert!(registry.add_verifier("mallory", "mallory").is_err());
    }
}
