// Spot price API client (CoinGecko simple/price)
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::PriceConfig;
use crate::error::{Error, Result};

/// `{<asset>: {<currency>: price}}`
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

pub struct PriceClient {
    client: Client,
    api_url: String,
    asset_id: String,
    timeout: Duration,
}

impl PriceClient {
    pub fn new(client: Client, config: &PriceConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            asset_id: config.asset_id.clone(),
            timeout: config.timeout(),
        }
    }

    /// Fetch the native asset price in `currency` (e.g. "usd")
    pub async fn fetch_spot_price(&self, currency: &str) -> Result<f64> {
        let currency = currency.to_lowercase();
        let url = format!("{}/simple/price", self.api_url);
        debug!("Fetching {} price in {}", self.asset_id, currency);

        let resp = self
            .client
            .get(&url)
            .query(&[("ids", self.asset_id.as_str()), ("vs_currencies", currency.as_str())])
            .timeout(self.timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let prices: SimplePriceResponse = resp.json().await?;
        prices
            .get(&self.asset_id)
            .and_then(|by_currency| by_currency.get(&currency))
            .copied()
            .ok_or_else(|| Error::PriceMissing {
                asset: self.asset_id.clone(),
                currency,
            })
    }
}
