//! DonorId - Opaque donor identity
//!
//! The join key between KYC status and ledger records. Wallet addresses are
//! lower-cased so `0xAbC…` and `0xabc…` resolve to the same donor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum identifier length
const MAX_LEN: usize = 128;

/// Errors that can occur when parsing donor identities
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DonorIdError {
    #[error("Empty donor id")]
    Empty,

    #[error("Donor id too long (max 128 chars): {0}")]
    TooLong(String),

    #[error("Donor id contains whitespace or control characters: {0:?}")]
    InvalidCharacter(String),
}

/// Donor identity (wallet address or account id)
///
/// # Example
/// ```
/// use campaign_core::DonorId;
///
/// let a: DonorId = "0xAbCd00000000000000000000000000000000EF12".parse().unwrap();
/// let b: DonorId = "0xabcd00000000000000000000000000000000ef12".parse().unwrap();
/// assert_eq!(a, b);
/// assert!(a.is_wallet_address());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DonorId(String);

impl DonorId {
    /// Create a donor id, normalising wallet addresses
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DonorIdError> {
        let raw = raw.as_ref().trim();

        if raw.is_empty() {
            return Err(DonorIdError::Empty);
        }

        if raw.len() > MAX_LEN {
            return Err(DonorIdError::TooLong(raw.to_string()));
        }

        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(DonorIdError::InvalidCharacter(raw.to_string()));
        }

        if looks_like_address(raw) {
            Ok(Self(raw.to_ascii_lowercase()))
        } else {
            Ok(Self(raw.to_string()))
        }
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for `0x`-prefixed 20-byte hex addresses
    pub fn is_wallet_address(&self) -> bool {
        looks_like_address(&self.0)
    }
}

fn looks_like_address(s: &str) -> bool {
    let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) else {
        return false;
    };
    hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

impl fmt::Display for DonorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DonorId {
    type Err = DonorIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DonorId {
    type Error = DonorIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DonorId> for String {
    fn from(id: DonorId) -> Self {
        id.0
    }
}

impl AsRef<str> for DonorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
