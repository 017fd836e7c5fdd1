//! Campaign KYC - Donor verification status
//!
//! Provides:
//! - `KycLookup`: the read-only view the contribution flow consults
//! - `KycRegistry`: verifier-managed registry with an optional JSONL journal
//!
//! # Example
//!
//! ```
//! use campaign_core::DonorId;
//! use campaign_kyc::KycRegistry;
//!
//! let registry = KycRegistry::in_memory("owner");
//! let donor = DonorId::new("donor-1").unwrap();
//! registry.verify("owner", &donor).unwrap();
//! assert!(registry.verify("stranger", &donor).is_err());
//! ```

pub mod error;
pub mod registry;
pub mod status;
pub mod traits;

pub use error::{KycError, KycResult};
pub use registry::KycRegistry;
pub use status::{KycEvent, KycStatus};
pub use traits::KycLookup;
