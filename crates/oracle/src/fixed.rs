//! Fixed Price Oracle
//!
//! Administrator-set prices, the equivalent of a manual `setEthPrice`.
//! Used by the CLI and by tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::OracleError;
use crate::types::{Price, PriceOracle, TradingPair};

const SOURCE: &str = "fixed";

/// Price oracle backed by an in-memory table of fixed prices
pub struct FixedPriceOracle {
    prices: RwLock<HashMap<TradingPair, Price>>,
}

impl FixedPriceOracle {
    /// Create a new empty oracle
    pub fn new() -> Self {
        Self {
            prices: RwLock::new(HashMap::new()),
        }
    }

    /// Create an oracle quoting ETH/USD at `price`
    pub fn with_eth_price(price: Decimal) -> Result<Self, OracleError> {
        let oracle = Self::new();
        oracle.set_price(TradingPair::eth_usd(), price)?;
        Ok(oracle)
    }

    /// Set a fixed price for a pair; the price must be positive
    pub fn set_price(&self, pair: TradingPair, price: Decimal) -> Result<(), OracleError> {
        self.set_price_at(pair, price, Utc::now())
    }

    /// Set a price with an explicit timestamp
    pub fn set_price_at(
        &self,
        pair: TradingPair,
        price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<(), OracleError> {
        if price <= Decimal::ZERO {
            return Err(OracleError::InvalidPrice {
                pair: pair.to_string(),
                reason: "price must be positive".to_string(),
            });
        }

        let quote = Price {
            pair,
            value: price,
            timestamp,
            source: SOURCE.to_string(),
        };
        let mut prices = self.prices.write().map_err(|_| OracleError::Poisoned)?;
        prices.insert(pair, quote);
        tracing::info!(pair = %pair, price = %price, "Price updated");
        Ok(())
    }

    /// Remove a price
    pub fn remove_price(&self, pair: &TradingPair) -> Result<(), OracleError> {
        let mut prices = self.prices.write().map_err(|_| OracleError::Poisoned)?;
        prices.remove(pair);
        Ok(())
    }
}

impl Default for FixedPriceOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceOracle for FixedPriceOracle {
    async fn get_price(&self, pair: &TradingPair) -> Result<Price, OracleError> {
        let prices = self.prices.read().map_err(|_| OracleError::Poisoned)?;
        prices
            .get(pair)
            .cloned()
            .ok_or_else(|| OracleError::PairNotFound {
                pair: pair.to_string(),
            })
    }

    async fn supported_pairs(&self) -> Vec<TradingPair> {
        match self.prices.read() {
            Ok(prices) => prices.keys().copied().collect(),
            Err(_) => Vec::new(),
        }
    }
}
