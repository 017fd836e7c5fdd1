//! Eligibility Evaluator
//!
//! Pure, synchronous rule evaluation. The evaluator never reads the ledger
//! itself: the caller supplies KYC status and the donor's cumulative total.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. amount must be positive (`NonPositiveAmount`)
//! 2. donor must be KYC verified (`KycNotVerified`)
//! 3. amount within the per-transaction limit (`ExceedsPerTransactionLimit`)
//! 4. cumulative + amount within the cumulative limit (`ExceedsCumulativeLimit`)
//!
//! Checks 1-3 need no ledger read and are available on their own as
//! [`EligibilityEvaluator::precheck`].

use campaign_core::{Currency, DonorId, Money};

use crate::config::ContributionLimits;
use crate::decision::{Decision, Rejection, RejectionReason};
use crate::error::{EligibilityError, EligibilityResult};

/// Contribution eligibility rules
#[derive(Debug, Clone, Default)]
pub struct EligibilityEvaluator {
    limits: ContributionLimits,
}

impl EligibilityEvaluator {
    pub fn new(limits: ContributionLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ContributionLimits {
        &self.limits
    }

    /// Checks 1-3. `Ok(None)` means the attempt must go on to the cumulative check.
    pub fn precheck(
        &self,
        amount_usd: Money,
        kyc_verified: bool,
    ) -> EligibilityResult<Option<Rejection>> {
        ensure_usd(&amount_usd)?;
        ensure_usd(&self.limits.max_per_transaction_usd)?;

        if amount_usd.is_zero() {
            return Ok(Some(Rejection::new(
                RejectionReason::NonPositiveAmount,
                "Contribution amount must be greater than zero",
                None,
            )));
        }

        if !kyc_verified {
            return Ok(Some(Rejection::new(
                RejectionReason::KycNotVerified,
                "KYC verification required but not completed",
                None,
            )));
        }

        if amount_usd.compare(&self.limits.max_per_transaction_usd)?.is_gt() {
            return Ok(Some(Rejection::new(
                RejectionReason::ExceedsPerTransactionLimit,
                format!(
                    "Contribution of {} exceeds per-transaction limit of {}",
                    amount_usd, self.limits.max_per_transaction_usd
                ),
                None,
            )));
        }

        Ok(None)
    }

    /// Decide a contribution attempt
    ///
    /// Input errors (non-USD amounts) are `Err`; every business outcome is a
    /// `Decision`. Every rejection returned here carries the donor's remaining
    /// capacity.
    pub fn evaluate(
        &self,
        donor: &DonorId,
        amount_usd: Money,
        kyc_verified: bool,
        cumulative_so_far: Money,
    ) -> EligibilityResult<Decision> {
        ensure_usd(&cumulative_so_far)?;
        let remaining = self.limits.remaining_capacity(cumulative_so_far)?;

        if let Some(mut rejection) = self.precheck(amount_usd, kyc_verified)? {
            rejection.remaining_capacity = Some(remaining);
            tracing::debug!(donor = %donor, reason = %rejection.reason, "Precheck rejected");
            return Ok(Decision::Rejected(rejection));
        }

        // cumulative + amount > max  <=>  amount > max - cumulative (saturating)
        if amount_usd.compare(&remaining)?.is_gt() {
            let message = format!(
                "Would exceed cumulative limit of {} (current: {}, attempting: {}); remaining capacity {}",
                self.limits.max_cumulative_usd, cumulative_so_far, amount_usd, remaining
            );
            tracing::debug!(donor = %donor, %remaining, "Cumulative limit rejected");
            return Ok(Decision::rejected(
                RejectionReason::ExceedsCumulativeLimit,
                message,
                Some(remaining),
            ));
        }

        Ok(Decision::Accepted)
    }

    /// Largest amount the donor could contribute right now, ignoring KYC
    pub fn max_contribution(&self, cumulative_so_far: Money) -> EligibilityResult<Money> {
        let remaining = self.limits.remaining_capacity(cumulative_so_far)?;
        if remaining.compare(&self.limits.max_per_transaction_usd)?.is_gt() {
            Ok(self.limits.max_per_transaction_usd)
        } else {
            Ok(remaining)
        }
    }
}

fn ensure_usd(amount: &Money) -> EligibilityResult<()> {
    if amount.currency() != Currency::Usd {
        return Err(EligibilityError::CurrencyMismatch {
            expected: Currency::Usd,
            actual: amount.currency(),
        });
    }
    Ok(())
}
