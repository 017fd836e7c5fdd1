//! Application context - wires everything together

use std::path::{Path, PathBuf};
use std::sync::Arc;

use campaign_core::Currency;
use campaign_engine::{ContributionEngine, ContributionError, EngineConfig};
use campaign_kyc::{KycError, KycRegistry};
use campaign_ledger::{ContributionRecord, JournalLedger, LedgerError};
use campaign_oracle::{FixedPriceOracle, OracleError, TradingPair};
use campaign_projection::ProjectionEngine;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Last ETH/USD price set by an operator, persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub eth_usd: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Application context - wires together all components
pub struct AppContext {
    pub engine: ContributionEngine,
    pub kyc: Arc<KycRegistry>,
    pub ledger: Arc<JournalLedger>,
    pub oracle: Arc<FixedPriceOracle>,
    pub projection: Option<ProjectionEngine>,
    ledger_path: PathBuf,
    projection_path: PathBuf,
    price_path: PathBuf,
}

impl AppContext {
    /// Create a new application context
    ///
    /// Layout under `data_path`:
    /// - `config.json` (optional engine configuration)
    /// - `kyc.jsonl`, `ledger.jsonl` (journals, source of truth)
    /// - `price.json` (last operator-set ETH price)
    /// - `projection.db` (disposable SQLite read model)
    pub async fn new(data_path: impl AsRef<Path>, owner: &str) -> Result<Self, ContextError> {
        let data_path = data_path.as_ref();
        std::fs::create_dir_all(data_path)?;

        let ledger_path = ledger_path_in(data_path);
        let projection_path = data_path.join("projection.db");
        let price_path = data_path.join("price.json");

        let config = load_config(data_path)?;

        let kyc = Arc::new(KycRegistry::open(data_path.join("kyc.jsonl"), owner)?);
        let ledger = Arc::new(JournalLedger::open(
            &ledger_path,
            config.limits.max_cumulative_usd,
        )?);

        let eth_price = match load_price(&price_path)? {
            Some(snapshot) => snapshot.eth_usd,
            None => config.default_eth_price_usd,
        };
        let oracle = Arc::new(FixedPriceOracle::with_eth_price(eth_price)?);

        // Projection is optional; the ledger stays authoritative without it
        let projection = match ProjectionEngine::new(&projection_path).await {
            Ok(projection) => Some(projection),
            Err(e) => {
                tracing::warn!(error = %e, "Projection unavailable");
                None
            }
        };
        if let Some(ref proj) = projection {
            if let Err(e) = proj.replay(&*ledger).await {
                tracing::warn!(error = %e, "Projection replay failed");
            }
        }

        let engine = ContributionEngine::new(config, kyc.clone(), ledger.clone(), oracle.clone())?;

        Ok(Self {
            engine,
            kyc,
            ledger,
            oracle,
            projection,
            ledger_path,
            projection_path,
            price_path,
        })
    }

    /// Set the ETH/USD price and persist it
    pub fn set_eth_price(&self, price: Decimal) -> Result<PriceSnapshot, ContextError> {
        self.oracle.set_price(TradingPair::usd(Currency::Eth), price)?;

        let snapshot = PriceSnapshot {
            eth_usd: price,
            updated_at: Utc::now(),
        };
        std::fs::write(&self.price_path, serde_json::to_string_pretty(&snapshot)?)?;
        tracing::info!(price = %price, "ETH price updated");
        Ok(snapshot)
    }

    /// Feed a freshly appended record to the projection
    pub async fn project(&self, record: &ContributionRecord) {
        if let Some(ref projection) = self.projection {
            if let Err(e) = projection.apply(record).await {
                tracing::warn!(sequence = record.sequence, error = %e, "Projection update failed");
            }
        }
    }

    /// Get ledger journal path
    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    /// Get projection path
    pub fn projection_path(&self) -> &Path {
        &self.projection_path
    }
}

/// Ledger journal location under a data directory
pub fn ledger_path_in(data_path: &Path) -> PathBuf {
    data_path.join("ledger.jsonl")
}

/// Engine configuration from `config.json` (if present) and the environment
pub fn load_config(data_path: &Path) -> Result<EngineConfig, ContextError> {
    let config_path = data_path.join("config.json");
    let config = if config_path.exists() {
        EngineConfig::from_file(&config_path)?
    } else {
        EngineConfig::default()
    };
    Ok(config.apply_env()?)
}

fn load_price(path: &Path) -> Result<Option<PriceSnapshot>, ContextError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Errors while building the context
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Engine error: {0}")]
    Engine(#[from] ContributionError),

    #[error("KYC error: {0}")]
    Kyc(#[from] KycError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
