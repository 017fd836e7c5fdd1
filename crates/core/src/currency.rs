//! Currency - Type-safe currency/asset codes
//!
//! Contributions are limited in USD, but arrive as crypto assets.
//! Both sides use the same closed set of codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing currencies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("Empty currency code")]
    EmptyCode,

    #[error("Currency code too long (max 10 chars): {0}")]
    TooLong(String),

    #[error("Invalid currency code format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported currency: {0}")]
    Unsupported(String),
}

/// Currency/Asset codes accepted by the campaign
///
/// # Examples
/// ```
/// use campaign_core::Currency;
///
/// let eth: Currency = "eth".parse().unwrap();
/// assert_eq!(eth, Currency::Eth);
/// assert_eq!(Currency::Usd.to_string(), "USD");
/// assert_eq!(Currency::Usd.minor_unit_scale(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    // === Fiat ===
    /// US Dollar (limit currency)
    Usd,
    /// Euro
    Eur,
    /// British Pound
    Gbp,

    // === Stablecoins ===
    /// Tether USD
    Usdt,
    /// USD Coin
    Usdc,
    /// Dai
    Dai,

    // === Major Crypto ===
    /// Ether
    Eth,
    /// Bitcoin
    Btc,
    /// Solana
    Sol,
    /// Polygon
    Matic,
}

impl Currency {
    /// Returns the currency code as a string slice
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Usdt => "USDT",
            Currency::Usdc => "USDC",
            Currency::Dai => "DAI",
            Currency::Eth => "ETH",
            Currency::Btc => "BTC",
            Currency::Sol => "SOL",
            Currency::Matic => "MATIC",
        }
    }

    /// Number of fractional digits in one minor unit
    /// (cents for fiat, the chain's base unit for crypto).
    pub const fn minor_unit_scale(&self) -> u32 {
        match self {
            Currency::Usd | Currency::Eur | Currency::Gbp => 2,
            Currency::Usdt | Currency::Usdc => 6,
            Currency::Btc => 8,
            Currency::Sol => 9,
            Currency::Dai | Currency::Eth | Currency::Matic => 18,
        }
    }

    /// Returns true if this is a stablecoin
    pub fn is_stablecoin(&self) -> bool {
        matches!(self, Currency::Usdt | Currency::Usdc | Currency::Dai)
    }

    /// Returns true if this is fiat currency
    pub fn is_fiat(&self) -> bool {
        matches!(self, Currency::Usd | Currency::Eur | Currency::Gbp)
    }

    /// Returns true if this is a crypto asset that needs a price to value in USD
    pub fn is_crypto(&self) -> bool {
        !self.is_fiat()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();

        if s.is_empty() {
            return Err(CurrencyError::EmptyCode);
        }

        if s.len() > 10 {
            return Err(CurrencyError::TooLong(s));
        }

        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CurrencyError::InvalidFormat(s));
        }

        match s.as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "USDT" => Ok(Currency::Usdt),
            "USDC" => Ok(Currency::Usdc),
            "DAI" => Ok(Currency::Dai),
            "ETH" => Ok(Currency::Eth),
            "BTC" => Ok(Currency::Btc),
            "SOL" => Ok(Currency::Sol),
            "MATIC" => Ok(Currency::Matic),
            _ => Err(CurrencyError::Unsupported(s)),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.code().to_string()
    }
}
