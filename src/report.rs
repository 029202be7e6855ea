//! Screening report
//!
//! The report is assembled once per screening call from the ledger data,
//! sanctions hits and transaction analysis, and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzer::{AnalysisResult, CounterpartyCount, MaliciousInteraction};
use crate::sanctions::SanctionSummary;

/// Full risk report for one address
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningReport {
    pub metadata: ReportMetadata,
    pub summary: RiskSummary,
    pub financial_analysis: FinancialAnalysis,
    pub risk_details: RiskDetails,
    pub network_analysis: NetworkAnalysis,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub screening_time: DateTime<Utc>,
    pub wallet_address: String,
    /// Datasets consulted (registry, core list, auxiliary files)
    pub data_sources_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskSummary {
    /// Any sanctions hit or malicious interaction
    pub risk_flag: bool,
    pub sanctioned_entity_match: bool,
    pub malicious_interaction_count: usize,
    pub balance_eth: f64,
    pub balance_usd: f64,
    pub balance_eur: f64,
    pub total_transactions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialAnalysis {
    pub value_in_eth: f64,
    pub value_in_usd: f64,
    pub value_out_eth: f64,
    pub value_out_usd: f64,
    pub gas_paid_eth: f64,
    pub gas_paid_usd: f64,
    pub pnl_eth: f64,
    pub pnl_usd: f64,
    pub pnl_eur: f64,
    pub pnl_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskDetails {
    pub sanctions_hits: Vec<SanctionSummary>,
    pub malicious_interactions: Vec<MaliciousInteraction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkAnalysis {
    pub most_interacted_wallet: Option<CounterpartyCount>,
    /// Distinct counterparties across successful transactions
    pub unique_counterparties: usize,
    pub top_counterparties: Vec<CounterpartyCount>,
}

/// Ledger-side inputs to a report
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketData {
    pub balance_eth: f64,
    pub eth_usd: f64,
    pub eth_eur: f64,
}

/// Net flow: out minus in minus gas
pub fn pnl(analysis: &AnalysisResult) -> f64 {
    analysis.value_out - analysis.value_in - analysis.gas_paid
}

/// PnL relative to inflow, 0 when nothing flowed in
pub fn pnl_percent(pnl: f64, value_in: f64) -> f64 {
    if value_in > 0.0 {
        pnl / value_in * 100.0
    } else {
        0.0
    }
}

/// Builds a [`ScreeningReport`]
pub struct ReportBuilder {
    wallet_address: String,
    data_sources_count: usize,
    top_counterparties: usize,
}

impl ReportBuilder {
    pub fn new(wallet_address: &str, data_sources_count: usize, top_counterparties: usize) -> Self {
        Self {
            wallet_address: wallet_address.to_string(),
            data_sources_count,
            top_counterparties,
        }
    }

    pub fn build(
        self,
        analysis: AnalysisResult,
        sanctions_hits: Vec<SanctionSummary>,
        market: MarketData,
    ) -> ScreeningReport {
        let pnl_eth = pnl(&analysis);
        let sanctioned = !sanctions_hits.is_empty();
        let malicious_count = analysis.malicious_interactions.len();

        let network_analysis = NetworkAnalysis {
            most_interacted_wallet: analysis.most_frequent_counterparty(),
            unique_counterparties: analysis.counterparty_frequency.len(),
            top_counterparties: analysis
                .counterparty_frequency
                .ranked(self.top_counterparties),
        };

        ScreeningReport {
            metadata: ReportMetadata {
                screening_time: Utc::now(),
                wallet_address: self.wallet_address,
                data_sources_count: self.data_sources_count,
            },
            summary: RiskSummary {
                risk_flag: sanctioned || malicious_count > 0,
                sanctioned_entity_match: sanctioned,
                malicious_interaction_count: malicious_count,
                balance_eth: market.balance_eth,
                balance_usd: market.balance_eth * market.eth_usd,
                balance_eur: market.balance_eth * market.eth_eur,
                total_transactions: analysis.total_tx_count,
            },
            financial_analysis: FinancialAnalysis {
                value_in_eth: analysis.value_in,
                value_in_usd: analysis.value_in * market.eth_usd,
                value_out_eth: analysis.value_out,
                value_out_usd: analysis.value_out * market.eth_usd,
                gas_paid_eth: analysis.gas_paid,
                gas_paid_usd: analysis.gas_paid * market.eth_usd,
                pnl_eth,
                pnl_usd: pnl_eth * market.eth_usd,
                pnl_eur: pnl_eth * market.eth_eur,
                pnl_percent: pnl_percent(pnl_eth, analysis.value_in),
            },
            risk_details: RiskDetails {
                sanctions_hits,
                malicious_interactions: analysis.malicious_interactions,
            },
            network_analysis,
        }
    }
}
