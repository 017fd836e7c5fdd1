//! Campaign Projection - Contribution records to SQLite views
//!
//! Projections are DISPOSABLE - they can be rebuilt from the ledger at any time.
//! Nothing here feeds back into eligibility decisions.

pub mod contribution;
pub mod engine;
pub mod error;

pub use contribution::{ContributionProjection, DonorTotal, ProjectedContribution, ProjectionStats};
pub use engine::ProjectionEngine;
pub use error::ProjectionError;
