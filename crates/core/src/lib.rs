//! Campaign Core - Domain types
//!
//! This crate contains the fundamental types shared by every campaign crate:
//! - `Money`: Exact minor-unit amounts (never floating point)
//! - `NativeAmount`: Crypto amount as received, before USD conversion
//! - `Currency`: Type-safe currency/asset codes
//! - `DonorId`: Donor identity used as the KYC/ledger join key

pub mod currency;
pub mod donor;
pub mod money;

pub use currency::{Currency, CurrencyError};
pub use donor::{DonorId, DonorIdError};
pub use money::{Money, MoneyError, NativeAmount};
