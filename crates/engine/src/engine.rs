//! Contribution Engine - the ledger updater
//!
//! ```text
//! ContributionRequest
//!        │
//!        ▼
//!  paused? ──► Paused
//!        │
//!        ▼
//!  native → USD (once, oracle price, truncated)
//!        │
//!        ▼  spawned task, retried as a whole on transient failure
//! ┌──────────────────────────────────────────┐
//! │ amount check → KYC lookup (timeout)      │
//! │ precheck                                 │
//! │ lock donor                               │
//! │ cumulative read (timeout) → evaluate     │
//! │ append record (same lock)                │
//! └──────────────────────────────────────────┘
//!        │
//!        ▼
//! ContributionReceipt
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use campaign_core::{Currency, DonorId, Money, MoneyError, NativeAmount};
use campaign_eligibility::{Decision, EligibilityError, EligibilityEvaluator};
use campaign_kyc::{KycError, KycLookup};
use campaign_ledger::{ContributionLedger, LedgerError, NewRecord};
use campaign_oracle::{OracleError, PriceOracle, TradingPair};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{Collaborator, ContributionError, EngineResult};
use crate::info::{CampaignStats, ContributorInfo};
use crate::request::{ContributionAmount, ContributionReceipt, ContributionRequest, Conversion};

struct EngineInner {
    config: EngineConfig,
    evaluator: EligibilityEvaluator,
    kyc: Arc<dyn KycLookup>,
    ledger: Arc<dyn ContributionLedger>,
    oracle: Arc<dyn PriceOracle>,
    paused: AtomicBool,
}

/// Processes contribution attempts against the ledger
///
/// Cheap to clone; clones share collaborators and the pause flag.
#[derive(Clone)]
pub struct ContributionEngine {
    inner: Arc<EngineInner>,
}

impl ContributionEngine {
    pub fn new(
        config: EngineConfig,
        kyc: Arc<dyn KycLookup>,
        ledger: Arc<dyn ContributionLedger>,
        oracle: Arc<dyn PriceOracle>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let evaluator = EligibilityEvaluator::new(config.limits);
        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                evaluator,
                kyc,
                ledger,
                oracle,
                paused: AtomicBool::new(false),
            }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn evaluator(&self) -> &EligibilityEvaluator {
        &self.inner.evaluator
    }

    /// Submit one contribution attempt and record its outcome
    ///
    /// The attempt runs on its own task: if the caller stops waiting, the
    /// record is still written.
    pub async fn submit(&self, request: ContributionRequest) -> EngineResult<ContributionReceipt> {
        if self.is_paused() {
            return Err(ContributionError::Paused);
        }

        let correlation_id = request
            .correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let (amount_usd, conversion) = self.inner.to_usd(&request.amount).await?;

        tracing::debug!(
            donor = %request.donor,
            amount = %amount_usd,
            correlation_id = %correlation_id,
            "Contribution submitted"
        );

        let inner = self.inner.clone();
        let donor = request.donor;
        let task = tokio::spawn(async move {
            inner
                .submit_with_retry(donor, amount_usd, conversion, correlation_id)
                .await
        });

        task.await
            .map_err(|e| ContributionError::TaskFailed(e.to_string()))?
    }

    /// Evaluate without recording anything
    pub async fn preview(
        &self,
        donor: &DonorId,
        amount: &ContributionAmount,
    ) -> EngineResult<Decision> {
        let (amount_usd, _) = self.inner.to_usd(amount).await?;
        let kyc_verified = self.inner.kyc_verified(donor).await?;
        let cumulative = self.inner.cumulative(donor).await?;
        Ok(self
            .inner
            .evaluator
            .evaluate(donor, amount_usd, kyc_verified, cumulative)?)
    }

    /// Donor's standing and history
    pub async fn contributor_info(&self, donor: &DonorId) -> EngineResult<ContributorInfo> {
        let kyc_verified = self.inner.kyc_verified(donor).await?;
        let cumulative = self.inner.cumulative(donor).await?;
        let history = self
            .inner
            .with_timeout(Collaborator::Ledger, self.inner.ledger.records_for(donor))
            .await?
            .map_err(ContributionError::from)?;

        let limits = self.inner.evaluator.limits();
        Ok(ContributorInfo {
            donor: donor.clone(),
            kyc_verified,
            cumulative,
            remaining_capacity: limits.remaining_capacity(cumulative)?,
            max_contribution_now: self.inner.evaluator.max_contribution(cumulative)?,
            has_contributed: !cumulative.is_zero(),
            history,
        })
    }

    /// Campaign-wide totals
    pub async fn campaign_stats(&self) -> EngineResult<CampaignStats> {
        let stats = self
            .inner
            .with_timeout(Collaborator::Ledger, self.inner.ledger.stats())
            .await?
            .map_err(ContributionError::from)?;

        let eth_price_usd = self.inner.price(Currency::Eth).await.ok();
        let limits = self.inner.evaluator.limits();

        Ok(CampaignStats {
            total_raised: stats.total_raised,
            unique_contributors: stats.unique_contributors,
            accepted_count: stats.accepted_count,
            rejected_count: stats.rejected_count,
            average_contribution: stats.average_contribution(),
            max_per_transaction_usd: limits.max_per_transaction_usd,
            max_cumulative_usd: limits.max_cumulative_usd,
            eth_price_usd,
            paused: self.is_paused(),
        })
    }

    /// Per-transaction limit expressed in `asset`, rounded down
    pub async fn max_contribution_native(&self, asset: Currency) -> EngineResult<NativeAmount> {
        let price = self.inner.price(asset).await?;
        let limit = self.inner.evaluator.limits().max_per_transaction_usd.to_decimal();

        let amount = limit
            .checked_div(price)
            .ok_or_else(|| ContributionError::unavailable(Collaborator::PriceOracle, "price out of range"))?
            .round_dp_with_strategy(asset.minor_unit_scale(), RoundingStrategy::ToZero);

        Ok(NativeAmount::new(amount, asset))
    }

    /// Stop accepting new submissions
    pub fn pause(&self) {
        self.inner.paused.store(true, Ordering::SeqCst);
        tracing::warn!("Contributions paused");
    }

    pub fn resume(&self) {
        self.inner.paused.store(false, Ordering::SeqCst);
        tracing::info!("Contributions resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }
}

impl EngineInner {
    async fn submit_with_retry(
        &self,
        donor: DonorId,
        amount_usd: Money,
        conversion: Option<Conversion>,
        correlation_id: String,
    ) -> EngineResult<ContributionReceipt> {
        let max_attempts = self.config.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self
                .attempt(&donor, amount_usd, conversion.as_ref(), &correlation_id)
                .await
            {
                Ok(mut receipt) => {
                    receipt.attempts = attempt;
                    return Ok(receipt);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        donor = %donor,
                        attempt,
                        error = %e,
                        "Contribution attempt failed, retrying"
                    );
                    tokio::time::sleep(self.config.retry_backoff(attempt)).await;
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(donor = %donor, attempts = attempt, error = %e, "Retries exhausted");
                    return Err(ContributionError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    if matches!(e, ContributionError::InvariantViolation(_)) {
                        tracing::error!(donor = %donor, error = %e, "Ledger invariant violation");
                    }
                    return Err(e);
                }
            }
        }
    }

    /// One full read-evaluate-append pass
    async fn attempt(
        &self,
        donor: &DonorId,
        amount_usd: Money,
        conversion: Option<&Conversion>,
        correlation_id: &str,
    ) -> EngineResult<ContributionReceipt> {
        // A zero amount is rejected whatever the KYC status, so skip the lookup
        let kyc_verified = if amount_usd.is_zero() {
            false
        } else {
            self.kyc_verified(donor).await?
        };
        let precheck = self.evaluator.precheck(amount_usd, kyc_verified)?;

        let lock = self.ledger.lock_donor(donor).await?;

        let (decision, cumulative) = match precheck {
            Some(rejection) => (Decision::Rejected(rejection), None),
            None => {
                let cumulative = self.cumulative(donor).await?;
                let decision = self
                    .evaluator
                    .evaluate(donor, amount_usd, kyc_verified, cumulative)?;
                (decision, Some(cumulative))
            }
        };

        let mut new = match &decision {
            Decision::Accepted => NewRecord::accepted(donor.clone(), amount_usd, correlation_id),
            Decision::Rejected(rejection) => {
                NewRecord::rejected(donor.clone(), amount_usd, rejection, correlation_id)
            }
        };
        if let Some(conversion) = conversion {
            new = new.with_native(conversion.native);
        }

        let record = self.ledger.append(&lock, new).await?;
        drop(lock);

        let cumulative_after = match cumulative {
            Some(c) if decision.is_accepted() => Some(c.checked_add(&amount_usd)?),
            other => other,
        };

        match &decision {
            Decision::Accepted => tracing::info!(
                donor = %donor,
                amount = %amount_usd,
                sequence = record.sequence,
                "Contribution accepted"
            ),
            Decision::Rejected(rejection) => tracing::info!(
                donor = %donor,
                amount = %amount_usd,
                reason = %rejection.reason,
                sequence = record.sequence,
                "Contribution rejected"
            ),
        }

        Ok(ContributionReceipt {
            record,
            decision,
            cumulative_after,
            conversion: conversion.cloned(),
            attempts: 1,
        })
    }

    async fn to_usd(&self, amount: &ContributionAmount) -> EngineResult<(Money, Option<Conversion>)> {
        match amount {
            ContributionAmount::Usd(money) => {
                if money.currency() != Currency::Usd {
                    return Err(EligibilityError::CurrencyMismatch {
                        expected: Currency::Usd,
                        actual: money.currency(),
                    }
                    .into());
                }
                Ok((*money, None))
            }
            ContributionAmount::Native(native) => {
                if native.amount < Decimal::ZERO {
                    return Err(MoneyError::InvalidAmount {
                        input: native.to_string(),
                        reason: "amount cannot be negative",
                    }
                    .into());
                }
                let price_usd = self.price(native.asset).await?;
                let amount_usd = Money::from_native_asset(native, price_usd)?;
                tracing::debug!(native = %native, price = %price_usd, usd = %amount_usd, "Converted native amount");
                Ok((
                    amount_usd,
                    Some(Conversion {
                        native: *native,
                        price_usd,
                        amount_usd,
                    }),
                ))
            }
        }
    }

    async fn kyc_verified(&self, donor: &DonorId) -> EngineResult<bool> {
        self.with_timeout(Collaborator::KycStore, self.kyc.is_verified(donor))
            .await?
            .map_err(|e: KycError| ContributionError::unavailable(Collaborator::KycStore, e.to_string()))
    }

    async fn cumulative(&self, donor: &DonorId) -> EngineResult<Money> {
        self.with_timeout(Collaborator::Ledger, self.ledger.cumulative_accepted(donor))
            .await?
            .map_err(|e: LedgerError| {
                if e.is_transient() {
                    ContributionError::unavailable(Collaborator::Ledger, e.to_string())
                } else {
                    ContributionError::from(e)
                }
            })
    }

    async fn price(&self, asset: Currency) -> EngineResult<Decimal> {
        let pair = TradingPair::usd(asset);
        let price = self
            .with_timeout(
                Collaborator::PriceOracle,
                self.oracle.fresh_price(&pair, self.config.max_price_age_secs),
            )
            .await?
            .map_err(|e: OracleError| ContributionError::unavailable(Collaborator::PriceOracle, e.to_string()))?;
        Ok(price.value)
    }

    async fn with_timeout<T>(
        &self,
        collaborator: Collaborator,
        fut: impl Future<Output = T>,
    ) -> EngineResult<T> {
        let timeout = self.config.lookup_timeout();
        tokio::time::timeout(timeout, fut).await.map_err(|_| {
            tracing::warn!(%collaborator, timeout_ms = self.config.lookup_timeout_ms, "Lookup timed out");
            ContributionError::unavailable(
                collaborator,
                format!("timed out after {}ms", self.config.lookup_timeout_ms),
            )
        })
    }
}
