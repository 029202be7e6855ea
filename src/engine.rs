//! Screening engine
//!
//! Single public entry point. Each call runs
//! `Validate → FetchLedgerData → MatchSanctions → AnalyzeTransactions → BuildReport`
//! against datasets loaded once at construction. The engine holds no
//! per-call state, so one instance can serve concurrent screenings.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::analyzer::TransactionAnalyzer;
use crate::config::Config;
use crate::dataset::{DatasetCatalog, DatasetLoader};
use crate::ledger::{LedgerClient, LedgerSource};
use crate::report::{MarketData, ReportBuilder, ScreeningReport};
use crate::sanctions::SanctionsMatcher;

const ADDRESS_LEN: usize = 42;
const USD: &str = "usd";
const EUR: &str = "eur";

/// Stages of one screening call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreeningStage {
    Validate,
    FetchLedgerData,
    MatchSanctions,
    AnalyzeTransactions,
    BuildReport,
}

/// Why a screening stopped before fetching anything
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScreeningRejection {
    #[error("invalid address")]
    InvalidAddress,

    #[error("missing credential")]
    MissingCredential,
}

/// Serializes as `{"error": "<message>"}`
impl Serialize for ScreeningRejection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("error", &self.to_string())?;
        map.end()
    }
}

/// `0x`-prefixed, 42 characters
pub fn is_valid_address(address: &str) -> bool {
    address.starts_with("0x") && address.chars().count() == ADDRESS_LEN
}

/// Wallet screening engine
pub struct ScreeningEngine {
    ledger: Arc<dyn LedgerSource>,
    catalog: DatasetCatalog,
    matcher: SanctionsMatcher,
    top_counterparties: usize,
}

impl ScreeningEngine {
    /// Build from configuration: HTTP ledger client plus datasets from disk
    pub fn from_config(config: &Config) -> Self {
        let catalog = DatasetLoader::load(&config.datasets);
        let ledger = Arc::new(LedgerClient::new(config));
        Self::new(ledger, catalog, config.report.top_counterparties)
    }

    pub fn new(
        ledger: Arc<dyn LedgerSource>,
        catalog: DatasetCatalog,
        top_counterparties: usize,
    ) -> Self {
        Self {
            ledger,
            catalog,
            matcher: SanctionsMatcher::new(),
            top_counterparties,
        }
    }

    /// Datasets this engine screens against
    pub fn catalog(&self) -> &DatasetCatalog {
        &self.catalog
    }

    /// Screen one address
    pub async fn screen(&self, address: &str) -> Result<ScreeningReport, ScreeningRejection> {
        self.enter(ScreeningStage::Validate, address);
        if !is_valid_address(address) {
            debug!("Rejected malformed address {:?}", address);
            return Err(ScreeningRejection::InvalidAddress);
        }
        if !self.ledger.has_credential() {
            debug!("Rejected {}: no ledger credential configured", address);
            return Err(ScreeningRejection::MissingCredential);
        }

        self.enter(ScreeningStage::FetchLedgerData, address);
        let (transactions, balance_eth, eth_usd, eth_eur) = tokio::join!(
            self.ledger.get_transactions(address),
            self.ledger.get_balance(address),
            self.ledger.get_spot_price(USD),
            self.ledger.get_spot_price(EUR),
        );

        self.enter(ScreeningStage::MatchSanctions, address);
        let hits = self
            .matcher
            .match_address(address, self.catalog.sanctions_datasets());
        let sanctions_hits = self.matcher.summarize(&hits);

        self.enter(ScreeningStage::AnalyzeTransactions, address);
        let analysis =
            TransactionAnalyzer::new(&self.catalog.malicious).analyze(&transactions, address);

        self.enter(ScreeningStage::BuildReport, address);
        let market = MarketData {
            balance_eth,
            eth_usd,
            eth_eur,
        };
        let report =
            ReportBuilder::new(address, self.catalog.sources_count(), self.top_counterparties)
                .build(analysis, sanctions_hits, market);

        info!(
            "Screened {}: risk_flag={}, sanctions_hits={}, malicious_interactions={}, txs={}",
            address,
            report.summary.risk_flag,
            report.risk_details.sanctions_hits.len(),
            report.summary.malicious_interaction_count,
            report.summary.total_transactions
        );

        Ok(report)
    }

    /// Screen and render as JSON: the report, or `{"error": ..}`
    pub async fn screen_value(&self, address: &str) -> serde_json::Value {
        let rendered = match self.screen(address).await {
            Ok(report) => serde_json::to_value(report),
            Err(rejection) => serde_json::to_value(rejection),
        };
        rendered.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }))
    }

    fn enter(&self, stage: ScreeningStage, address: &str) {
        debug!("Screening {}: {:?}", address, stage);
    }
}
