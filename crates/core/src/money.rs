//! Money - Exact minor-unit amounts for contribution accounting
//!
//! Every amount that is compared against a contribution limit is a `Money`.
//! The value is stored as an integer count of minor units (cents for USD),
//! so comparisons and additions never touch binary floating point.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

use crate::currency::Currency;

/// Errors that can occur when constructing or combining amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: &'static str },

    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    #[error("Amount overflow: {0}")]
    Overflow(String),
}

impl MoneyError {
    fn invalid(input: impl fmt::Display, reason: &'static str) -> Self {
        MoneyError::InvalidAmount {
            input: input.to_string(),
            reason,
        }
    }
}

/// A non-negative amount of a single currency, held in integer minor units.
///
/// # Invariant
/// The amount is never negative and never carries more fractional digits
/// than [`Currency::minor_unit_scale`] allows. Both are enforced by the
/// constructors.
///
/// # Example
/// ```
/// use campaign_core::{Currency, Money};
///
/// let a = Money::usd("100.25").unwrap();
/// let b = Money::from_minor_units(75, Currency::Usd).unwrap();
/// assert_eq!(a.checked_add(&b).unwrap(), Money::usd("101").unwrap());
///
/// // Negative amounts and sub-cent precision are rejected
/// assert!(Money::usd("-1").is_err());
/// assert!(Money::usd("0.001").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MoneyRepr", into = "MoneyRepr")]
pub struct Money {
    minor_units: u64,
    currency: Currency,
}

impl Money {
    /// Zero US dollars
    pub const ZERO_USD: Self = Self {
        minor_units: 0,
        currency: Currency::Usd,
    };

    /// Zero in the given currency
    pub const fn zero(currency: Currency) -> Self {
        Self {
            minor_units: 0,
            currency,
        }
    }

    /// US dollar amount from whole cents
    pub const fn usd_cents(cents: u64) -> Self {
        Self {
            minor_units: cents,
            currency: Currency::Usd,
        }
    }

    /// Create from an integer count of minor units.
    ///
    /// Returns `InvalidAmount` if `minor_units` is negative.
    pub fn from_minor_units(minor_units: i64, currency: Currency) -> Result<Self, MoneyError> {
        let minor_units = u64::try_from(minor_units)
            .map_err(|_| MoneyError::invalid(minor_units, "amount cannot be negative"))?;
        Ok(Self {
            minor_units,
            currency,
        })
    }

    /// Create from an exact decimal value.
    ///
    /// Fails when the value is negative, has more fractional digits than the
    /// currency allows, or does not fit in the minor-unit range.
    pub fn from_decimal(value: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        if value < Decimal::ZERO {
            return Err(MoneyError::invalid(value, "amount cannot be negative"));
        }

        let scale = currency.minor_unit_scale();
        let normalized = value.normalize();
        if normalized.scale() > scale {
            return Err(MoneyError::invalid(value, "too many decimal places"));
        }

        let factor = Decimal::from(10u64.pow(scale));
        let minor_units = normalized
            .checked_mul(factor)
            .and_then(|scaled| scaled.to_u64())
            .ok_or_else(|| MoneyError::invalid(value, "amount out of range"))?;

        Ok(Self {
            minor_units,
            currency,
        })
    }

    /// Parse a decimal string such as `"3300"` or `"12.50"`.
    ///
    /// Non-numeric input (including `NaN` and `inf`) is `InvalidAmount`.
    pub fn parse(input: &str, currency: Currency) -> Result<Self, MoneyError> {
        let trimmed = input.trim().trim_start_matches('$').replace(',', "");
        let value: Decimal = trimmed
            .parse()
            .map_err(|_| MoneyError::invalid(input, "not a decimal number"))?;
        Self::from_decimal(value, currency)
    }

    /// Parse a US dollar amount
    pub fn usd(input: &str) -> Result<Self, MoneyError> {
        Self::parse(input, Currency::Usd)
    }

    /// Convert a received crypto amount to its USD value.
    ///
    /// The product is truncated toward zero to whole cents, so the credited
    /// USD value is never more than what was actually sent.
    pub fn from_native_asset(
        native: &NativeAmount,
        price_per_unit_usd: Decimal,
    ) -> Result<Self, MoneyError> {
        if native.amount < Decimal::ZERO {
            return Err(MoneyError::invalid(native, "amount cannot be negative"));
        }
        if price_per_unit_usd <= Decimal::ZERO {
            return Err(MoneyError::invalid(price_per_unit_usd, "price must be positive"));
        }

        let usd = native
            .amount
            .checked_mul(price_per_unit_usd)
            .ok_or_else(|| MoneyError::invalid(native, "conversion out of range"))?;
        let truncated = usd.round_dp_with_strategy(
            Currency::Usd.minor_unit_scale(),
            RoundingStrategy::ToZero,
        );

        Self::from_decimal(truncated, Currency::Usd)
    }

    /// Amount in minor units
    #[inline]
    pub const fn minor_units(&self) -> u64 {
        self.minor_units
    }

    /// Currency tag
    #[inline]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Check if the amount is zero
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.minor_units == 0
    }

    /// Exact decimal value (e.g. `12.34` for 1234 cents)
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.minor_units as i128, self.currency.minor_unit_scale())
    }

    /// Exact addition
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let minor_units = self
            .minor_units
            .checked_add(other.minor_units)
            .ok_or_else(|| MoneyError::Overflow(format!("{} + {}", self, other)))?;
        Ok(Money {
            minor_units,
            currency: self.currency,
        })
    }

    /// Subtraction clamped at zero
    pub fn saturating_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Money {
            minor_units: self.minor_units.saturating_sub(other.minor_units),
            currency: self.currency,
        })
    }

    /// Three-way comparison; amounts in different currencies are not comparable
    pub fn compare(&self, other: &Money) -> Result<Ordering, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.minor_units.cmp(&other.minor_units))
    }

    /// Sum a sequence of amounts in the given currency
    pub fn sum<'a>(
        amounts: impl IntoIterator<Item = &'a Money>,
        currency: Currency,
    ) -> Result<Money, MoneyError> {
        amounts
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.checked_add(m))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        Ok(())
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other).ok()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.currency {
            Currency::Usd => write!(f, "${}", self.to_decimal()),
            other => write!(f, "{} {}", self.to_decimal(), other),
        }
    }
}

/// Wire representation: `{ "amount": "12.34", "currency": "USD" }`
#[derive(Serialize, Deserialize)]
struct MoneyRepr {
    amount: Decimal,
    currency: Currency,
}

impl TryFrom<MoneyRepr> for Money {
    type Error = MoneyError;

    fn try_from(repr: MoneyRepr) -> Result<Self, Self::Error> {
        Money::from_decimal(repr.amount, repr.currency)
    }
}

impl From<Money> for MoneyRepr {
    fn from(money: Money) -> Self {
        MoneyRepr {
            amount: money.to_decimal(),
            currency: money.currency,
        }
    }
}

/// Crypto amount as received on-chain (e.g. `0.5 ETH`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeAmount {
    pub amount: Decimal,
    pub asset: Currency,
}

impl NativeAmount {
    pub fn new(amount: Decimal, asset: Currency) -> Self {
        Self { amount, asset }
    }

    /// Ether amount
    pub fn eth(amount: Decimal) -> Self {
        Self::new(amount, Currency::Eth)
    }
}

impl fmt::Display for NativeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_usd() {
        let m = Money::usd("3300").unwrap();
        assert_eq!(m.minor_units(), 330_000);
        assert_eq!(m.currency(), Currency::Usd);

        let m = Money::usd("$1,250.5").unwrap();
        assert_eq!(m.minor_units(), 125_050);
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            Money::usd("-5"),
            Err(MoneyError::InvalidAmount { .. })
        ));
        assert!(matches!(
            Money::from_minor_units(-1, Currency::Usd),
            Err(MoneyError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_non_numeric_rejected() {
        for input in ["", "abc", "NaN", "inf", "1e400"] {
            assert!(
                matches!(Money::usd(input), Err(MoneyError::InvalidAmount { .. })),
                "expected rejection for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_precision_limit() {
        assert!(Money::usd("10.001").is_err());
        // Trailing zeros are not extra precision
        assert_eq!(Money::usd("10.100").unwrap(), Money::usd_cents(1010));
    }

    #[test]
    fn test_add_exact() {
        let a = Money::usd("0.10").unwrap();
        let b = Money::usd("0.20").unwrap();
        assert_eq!(a.checked_add(&b).unwrap(), Money::usd("0.30").unwrap());
    }

    #[test]
    fn test_add_currency_mismatch() {
        let usd = Money::usd("1").unwrap();
        let eur = Money::parse("1", Currency::Eur).unwrap();
        assert!(matches!(
            usd.checked_add(&eur),
            Err(MoneyError::CurrencyMismatch { .. })
        ));
        assert!(usd.partial_cmp(&eur).is_none());
    }

    #[test]
    fn test_add_overflow() {
        let max = Money::from_minor_units(i64::MAX, Currency::Usd).unwrap();
        let huge = Money::usd_cents(u64::MAX - 10);
        assert!(matches!(huge.checked_add(&max), Err(MoneyError::Overflow(_))));
    }

    #[test]
    fn test_compare() {
        let a = Money::usd("3000").unwrap();
        let b = Money::usd("3300").unwrap();
        assert_eq!(a.compare(&b).unwrap(), Ordering::Less);
        assert_eq!(b.compare(&b).unwrap(), Ordering::Equal);
        assert!(b > a);
    }

    #[test]
    fn test_saturating_sub() {
        let cap = Money::usd("3300").unwrap();
        let used = Money::usd("3500").unwrap();
        assert!(cap.saturating_sub(&used).unwrap().is_zero());
        assert_eq!(
            cap.saturating_sub(&Money::usd("3000").unwrap()).unwrap(),
            Money::usd("300").unwrap()
        );
    }

    #[test]
    fn test_from_native_rounds_down() {
        // 0.333333 ETH * $3000 = $999.999 -> $999.99
        let native = NativeAmount::eth(dec!(0.333333));
        let usd = Money::from_native_asset(&native, dec!(3000)).unwrap();
        assert_eq!(usd, Money::usd("999.99").unwrap());

        // Never above the true value
        assert!(usd.to_decimal() <= native.amount * dec!(3000));
    }

    #[test]
    fn test_from_native_exact() {
        let native = NativeAmount::eth(dec!(1.1));
        let usd = Money::from_native_asset(&native, dec!(3000)).unwrap();
        assert_eq!(usd, Money::usd("3300").unwrap());
    }

    #[test]
    fn test_from_native_rejects_bad_price() {
        let native = NativeAmount::eth(dec!(1));
        assert!(Money::from_native_asset(&native, Decimal::ZERO).is_err());
        assert!(Money::from_native_asset(&native, dec!(-3000)).is_err());
        assert!(Money::from_native_asset(&NativeAmount::eth(dec!(-1)), dec!(3000)).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::usd("12.5").unwrap().to_string(), "$12.50");
        assert_eq!(
            Money::parse("7", Currency::Eur).unwrap().to_string(),
            "7.00 EUR"
        );
    }

    #[test]
    fn test_serde_shape() {
        let m = Money::usd("123.45").unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"amount\":\"123.45\""));
        assert!(json.contains("\"currency\":\"USD\""));

        let parsed: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, m);

        // Invalid values are rejected on the way in
        let bad = r#"{"amount":"-1","currency":"USD"}"#;
        assert!(serde_json::from_str::<Money>(bad).is_err());
    }
}
