//! Block-explorer API client (Etherscan-compatible)
//!
//! Provides access to:
//! - Account transaction list (full block range, ascending)
//! - Native balance at the latest block

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LedgerConfig;
use crate::error::{Error, Result};

use super::types::{wei_to_eth, ExplorerResponse, Transaction};

const START_BLOCK: &str = "0";
const END_BLOCK: &str = "99999999";

/// Explorer reports an empty history this way, it is not a failure
const NO_TRANSACTIONS: &str = "No transactions found";

/// Block-explorer API client
pub struct ExplorerClient {
    /// HTTP client
    client: Client,
    /// API endpoint
    api_url: String,
    /// API key
    api_key: Option<String>,
    /// Timeout for balance lookups
    timeout: Duration,
    /// Timeout for transaction list lookups
    tx_timeout: Duration,
}

impl ExplorerClient {
    /// Create over a shared HTTP client
    pub fn new(client: Client, config: &LedgerConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key().map(str::to_string),
            timeout: config.timeout(),
            tx_timeout: config.tx_timeout(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch the full transaction list in chain order
    pub async fn fetch_transactions(&self, address: &str) -> Result<Vec<Transaction>> {
        debug!("Fetching transaction list for {}", address);

        let response = self
            .call(
                &[
                    ("module", "account"),
                    ("action", "txlist"),
                    ("address", address),
                    ("startblock", START_BLOCK),
                    ("endblock", END_BLOCK),
                    ("sort", "asc"),
                ],
                self.tx_timeout,
            )
            .await?;

        if !response.is_ok() {
            if response.message == NO_TRANSACTIONS {
                return Ok(Vec::new());
            }
            let message = explorer_message(&response);
            return Err(Error::NoData {
                status: response.status,
                message,
            });
        }

        let records: Vec<Value> = serde_json::from_value(response.result)
            .map_err(|e| Error::Decode(format!("Transaction list is not an array: {}", e)))?;

        let total = records.len();
        let transactions: Vec<Transaction> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(tx) => Some(tx),
                Err(e) => {
                    warn!("Skipping transaction record {} for {}: {}", index, address, e);
                    None
                }
            })
            .collect();

        if transactions.len() < total {
            warn!(
                "Kept {} of {} transaction records for {}",
                transactions.len(),
                total,
                address
            );
        }

        Ok(transactions)
    }

    /// Fetch the latest native balance in display units
    pub async fn fetch_balance(&self, address: &str) -> Result<f64> {
        debug!("Fetching balance for {}", address);

        let response = self
            .call(
                &[
                    ("module", "account"),
                    ("action", "balance"),
                    ("address", address),
                    ("tag", "latest"),
                ],
                self.timeout,
            )
            .await?;

        if !response.is_ok() {
            let message = explorer_message(&response);
            return Err(Error::NoData {
                status: response.status,
                message,
            });
        }

        let raw = response
            .result
            .as_str()
            .ok_or_else(|| Error::Decode(format!("Balance is not a string: {}", response.result)))?;
        raw.trim()
            .parse::<u128>()
            .map_err(|e| Error::Decode(format!("Invalid balance {:?}: {}", raw, e)))?;

        Ok(wei_to_eth(raw))
    }

    async fn call(&self, params: &[(&str, &str)], timeout: Duration) -> Result<ExplorerResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("Ledger API key not configured".to_string()))?;

        let response = self
            .client
            .get(&self.api_url)
            .query(params)
            .query(&[("apikey", api_key)])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Explorer request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("Failed to parse explorer response: {}", e)))
    }
}

/// Explorer error text lives in `result` for some failures, `message` for others
fn explorer_message(response: &ExplorerResponse) -> String {
    match response.result.as_str() {
        Some(detail) if !detail.is_empty() => format!("{}: {}", response.message, detail),
        _ => response.message.clone(),
    }
}
