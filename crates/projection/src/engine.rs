//! Projection engine - coordinates replay and updates

use std::path::Path;

use campaign_ledger::{ContributionLedger, ContributionRecord};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::contribution::ContributionProjection;
use crate::error::ProjectionError;

/// Projection engine - coordinates replay and updates
pub struct ProjectionEngine {
    pub contributions: ContributionProjection,
}

impl ProjectionEngine {
    /// Create a new projection engine backed by a SQLite file
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, ProjectionError> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path.as_ref().display());
        let pool = SqlitePool::connect(&db_url).await?;
        Self::from_pool(pool).await
    }

    /// Throwaway in-memory projection
    ///
    /// A single connection, since every `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self, ProjectionError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, ProjectionError> {
        let contributions = ContributionProjection::new(pool);
        contributions.init().await?;
        Ok(Self { contributions })
    }

    /// Apply a single record
    pub async fn apply(&self, record: &ContributionRecord) -> Result<(), ProjectionError> {
        self.contributions.apply(record).await?;
        Ok(())
    }

    /// Rebuild from the ledger
    pub async fn replay(&self, ledger: &dyn ContributionLedger) -> Result<usize, ProjectionError> {
        let records = ledger.records().await?;
        self.replay_records(&records).await
    }

    /// Rebuild from an already-loaded record list
    pub async fn replay_records(
        &self,
        records: &[ContributionRecord],
    ) -> Result<usize, ProjectionError> {
        self.contributions.clear().await?;

        for record in records {
            self.contributions.apply(record).await?;
        }

        tracing::debug!(records = records.len(), "Projection rebuilt");
        Ok(records.len())
    }

    /// Get the contribution projection
    pub fn contributions(&self) -> &ContributionProjection {
        &self.contributions
    }
}
