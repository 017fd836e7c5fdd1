//! Core oracle types

use async_trait::async_trait;
use campaign_core::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::OracleError;

/// A price pair (e.g., ETH/USD)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    /// Asset being priced (e.g., ETH)
    pub base: Currency,
    /// Unit of the price (e.g., USD)
    pub quote: Currency,
}

impl TradingPair {
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// Price of `asset` in US dollars
    pub fn usd(asset: Currency) -> Self {
        Self::new(asset, Currency::Usd)
    }

    pub fn eth_usd() -> Self {
        Self::usd(Currency::Eth)
    }
}

impl std::fmt::Display for TradingPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// A price quote with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    /// The pair
    pub pair: TradingPair,
    /// Quote units per one whole unit of the base asset
    pub value: Decimal,
    /// Timestamp when this price was set or fetched
    pub timestamp: DateTime<Utc>,
    /// Source of the price (e.g., "fixed", "chainlink")
    pub source: String,
}

impl Price {
    pub fn new(pair: TradingPair, value: Decimal, source: impl Into<String>) -> Self {
        Self {
            pair,
            value,
            timestamp: Utc::now(),
            source: source.into(),
        }
    }

    /// Age of the quote in whole seconds
    pub fn age_secs(&self) -> i64 {
        Utc::now().signed_duration_since(self.timestamp).num_seconds()
    }

    /// Check if price is stale (older than threshold)
    pub fn is_stale(&self, max_age_secs: u64) -> bool {
        self.age_secs() > max_age_secs as i64
    }
}

/// Price Oracle trait - interface for price feeds
///
/// Implementations can be:
/// - FixedPriceOracle: administrator-set prices
/// - ChainlinkOracle: on-chain aggregator feeds
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Get the current price for a pair
    async fn get_price(&self, pair: &TradingPair) -> Result<Price, OracleError>;

    /// Get a list of all supported pairs
    async fn supported_pairs(&self) -> Vec<TradingPair>;

    /// Get a price, failing if it is older than `max_age_secs`
    async fn fresh_price(
        &self,
        pair: &TradingPair,
        max_age_secs: u64,
    ) -> Result<Price, OracleError> {
        let price = self.get_price(pair).await?;
        if price.is_stale(max_age_secs) {
            return Err(OracleError::StalePrice {
                pair: pair.to_string(),
                last_update: price.timestamp.to_rfc3339(),
                threshold_secs: max_age_secs,
            });
        }
        Ok(price)
    }

    /// Check if a pair is supported
    async fn is_supported(&self, pair: &TradingPair) -> bool {
        self.supported_pairs().await.contains(pair)
    }
}
