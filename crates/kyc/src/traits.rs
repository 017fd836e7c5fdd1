//! KYC lookup trait - the only view of KYC the contribution flow needs

use async_trait::async_trait;
use campaign_core::DonorId;

use crate::error::KycResult;
use crate::status::KycStatus;

/// Read-only KYC lookup
///
/// Implementations can be:
/// - `KycRegistry`: local verifier-managed registry
/// - an HTTP client for a hosted identity provider
///
/// Unknown donors are reported as not verified. Infrastructure failures
/// must be returned as `Err`, never as `Ok(false)`.
#[async_trait]
pub trait KycLookup: Send + Sync {
    /// Whether the donor has passed KYC
    async fn is_verified(&self, donor: &DonorId) -> KycResult<bool>;

    /// Full status record, if the store has one
    async fn status(&self, donor: &DonorId) -> KycResult<Option<KycStatus>>;
}
