//! Campaign Price Oracle
//!
//! Provides asset/USD prices used to convert native-asset contributions into
//! US dollars at ingestion.

mod error;
mod fixed;
mod types;

pub use error::OracleError;
pub use fixed::FixedPriceOracle;
pub use types::{Price, PriceOracle, TradingPair};
