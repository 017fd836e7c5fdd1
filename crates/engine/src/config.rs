//! Engine configuration
//!
//! Loaded from a JSON file with per-field defaults, then optionally
//! overridden from the environment.

use std::time::Duration;

use campaign_core::Money;
use campaign_eligibility::ContributionLimits;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ContributionError, EngineResult};

pub const ENV_MAX_PER_TX_USD: &str = "CAMPAIGN_MAX_PER_TX_USD";
pub const ENV_MAX_CUMULATIVE_USD: &str = "CAMPAIGN_MAX_CUMULATIVE_USD";
pub const ENV_LOOKUP_TIMEOUT_MS: &str = "CAMPAIGN_LOOKUP_TIMEOUT_MS";

/// Configuration for the contribution engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub limits: ContributionLimits,

    /// Timeout for each KYC lookup, ledger read and price fetch
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,

    /// Attempts of the whole read-evaluate-append sequence
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts, multiplied by the attempt number
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Oldest price quote accepted for native-asset conversion
    #[serde(default = "default_max_price_age_secs")]
    pub max_price_age_secs: u64,

    /// ETH/USD price seeded into the fixed oracle
    #[serde(default = "default_eth_price_usd")]
    pub default_eth_price_usd: Decimal,
}

fn default_lookup_timeout_ms() -> u64 {
    500
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    50
}

fn default_max_price_age_secs() -> u64 {
    300 // 5 minutes
}

fn default_eth_price_usd() -> Decimal {
    Decimal::new(3_000, 0)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: ContributionLimits::default(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_price_age_secs: default_max_price_age_secs(),
            default_eth_price_usd: default_eth_price_usd(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ContributionError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ContributionError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CAMPAIGN_*` environment overrides
    pub fn apply_env(self) -> EngineResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (environment, test map)
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> EngineResult<Self> {
        if let Some(value) = lookup(ENV_MAX_PER_TX_USD) {
            self.limits.max_per_transaction_usd = parse_usd(ENV_MAX_PER_TX_USD, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_CUMULATIVE_USD) {
            self.limits.max_cumulative_usd = parse_usd(ENV_MAX_CUMULATIVE_USD, &value)?;
        }
        if let Some(value) = lookup(ENV_LOOKUP_TIMEOUT_MS) {
            self.lookup_timeout_ms = value.trim().parse().map_err(|_| {
                ContributionError::Config(format!("{} is not a number: {}", ENV_LOOKUP_TIMEOUT_MS, value))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.limits.validate()?;
        if self.max_attempts == 0 {
            return Err(ContributionError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.default_eth_price_usd <= Decimal::ZERO {
            return Err(ContributionError::Config(
                "default_eth_price_usd must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Get lookup timeout as Duration
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Backoff before the given (1-based) retry
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(attempt as u64))
    }
}

fn parse_usd(key: &str, value: &str) -> EngineResult<Money> {
    Money::usd(value).map_err(|e| ContributionError::Config(format!("{}: {}", key, e)))
}
