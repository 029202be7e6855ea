//! Ledger data access
//!
//! [`LedgerSource`] is the boundary the screening engine talks to. Its
//! methods never fail: [`LedgerClient`] absorbs network errors, timeouts,
//! non-success statuses and malformed bodies, logs them, and returns the
//! documented default (empty list / 0.0) so screening proceeds with degraded
//! data instead of aborting.

use async_trait::async_trait;
use tracing::warn;

use crate::config::Config;

pub mod explorer;
pub mod price;
pub mod types;

pub use explorer::ExplorerClient;
pub use price::PriceClient;
pub use types::{wei_to_eth, Transaction, WEI_PER_ETH};

/// Read-only access to account history, balance and spot prices
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Whether a ledger credential is configured
    fn has_credential(&self) -> bool;

    /// Transactions in ascending chain order; empty on failure
    async fn get_transactions(&self, address: &str) -> Vec<Transaction>;

    /// Native balance in display units; 0.0 on failure
    async fn get_balance(&self, address: &str) -> f64;

    /// Native asset price in `fiat_currency`; 0.0 on failure
    async fn get_spot_price(&self, fiat_currency: &str) -> f64;
}

/// Production ledger source: block explorer plus price API
pub struct LedgerClient {
    explorer: ExplorerClient,
    prices: PriceClient,
}

impl LedgerClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder().build().unwrap_or_default();
        Self {
            explorer: ExplorerClient::new(client.clone(), &config.ledger),
            prices: PriceClient::new(client, &config.price),
        }
    }
}

#[async_trait]
impl LedgerSource for LedgerClient {
    fn has_credential(&self) -> bool {
        self.explorer.has_api_key()
    }

    async fn get_transactions(&self, address: &str) -> Vec<Transaction> {
        match self.explorer.fetch_transactions(address).await {
            Ok(txs) => txs,
            Err(e) => {
                warn!("Transaction list for {} unavailable, using empty list: {}", address, e);
                Vec::new()
            }
        }
    }

    async fn get_balance(&self, address: &str) -> f64 {
        match self.explorer.fetch_balance(address).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!("Balance for {} unavailable, using 0: {}", address, e);
                0.0
            }
        }
    }

    async fn get_spot_price(&self, fiat_currency: &str) -> f64 {
        match self.prices.fetch_spot_price(fiat_currency).await {
            Ok(price) => price,
            Err(e) => {
                warn!("Spot price in {} unavailable, using 0: {}", fiat_currency, e);
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve canned HTTP responses; `route` maps the request line to (status, body)
    async fn serve(route: fn(&str) -> (u16, String)) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&buf);
                    let request_line = request.lines().next().unwrap_or_default().to_string();
                    let (status, body) = route(&request_line);
                    let response = format!(
                        "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        addr
    }

    fn client_for(addr: SocketAddr, api_key: Option<&str>) -> LedgerClient {
        let mut config = Config::default();
        config.ledger.api_url = format!("http://{}/api", addr);
        config.ledger.api_key = api_key.map(str::to_string);
        config.ledger.timeout_ms = 2_000;
        config.ledger.tx_timeout_ms = 2_000;
        config.price.api_url = format!("http://{}/api/v3", addr);
        config.price.timeout_ms = 2_000;
        LedgerClient::new(&config)
    }

    fn healthy(request_line: &str) -> (u16, String) {
        if request_line.contains("action=txlist") {
            (
                200,
                r#"{"status":"1","message":"OK","result":[
                    {"hash":"0xa","from":"0x1","to":"0x2","value":"1000000000000000000","gasUsed":"21000","gasPrice":"1000000000","isError":"0"},
                    {"hash":"0xb","from":"0x2","to":"","value":"0","gasUsed":"50000","gasPrice":"1000000000","isError":"1"}
                ]}"#
                .to_string(),
            )
        } else if request_line.contains("action=balance") {
            (200, r#"{"status":"1","message":"OK","result":"2500000000000000000"}"#.to_string())
        } else if request_line.contains("vs_currencies=usd") {
            (200, r#"{"ethereum":{"usd":3120.5}}"#.to_string())
        } else {
            (200, r#"{"ethereum":{}}"#.to_string())
        }
    }

    fn failing(request_line: &str) -> (u16, String) {
        if request_line.contains("action=txlist") {
            (
                200,
                r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#.to_string(),
            )
        } else if request_line.contains("action=balance") {
            (200, r#"{"status":"1","message":"OK","result":"lots"}"#.to_string())
        } else {
            (503, "overloaded".to_string())
        }
    }

    #[tokio::test]
    async fn test_healthy_responses() {
        let addr = serve(healthy).await;
        let client = client_for(addr, Some("KEY"));

        assert!(client.has_credential());

        let txs = client.get_transactions("0x1").await;
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[1].to, None);
        assert!(txs[1].is_error);

        assert!((client.get_balance("0x1").await - 2.5).abs() < 1e-12);
        assert_eq!(client.get_spot_price("usd").await, 3120.5);
        // currency missing from the body
        assert_eq!(client.get_spot_price("eur").await, 0.0);
    }

    fn mixed_history(request_line: &str) -> (u16, String) {
        if request_line.contains("action=txlist") {
            (
                200,
                r#"{"status":"1","message":"OK","result":[
                    {"hash":"0xa","from":"0x1","to":"0x2","value":"1000000000000000000","gasUsed":"21000","gasPrice":"1000000000","isError":"0"},
                    {"hash":"0xb","from":"0x2","to":"0x1","value":1000000000000000000,"gasUsed":21000,"gasPrice":"1000000000","isError":"0"},
                    {"hash":"0xc","from":null,"to":"0x1","value":"5","isError":"0"},
                    "not a transaction"
                ]}"#
                .to_string(),
            )
        } else {
            (503, "overloaded".to_string())
        }
    }

    #[tokio::test]
    async fn test_bad_record_does_not_drop_history() {
        let addr = serve(mixed_history).await;
        let client = client_for(addr, Some("KEY"));

        let txs = client.get_transactions("0x1").await;
        assert_eq!(txs.len(), 3);
        assert!((txs[1].value_eth() - 1.0).abs() < 1e-12);
        assert_eq!(txs[1].gas_used, "21000");
        assert_eq!(txs[2].from, "");
    }

    #[tokio::test]
    async fn test_failures_degrade_to_defaults() {
        let addr = serve(failing).await;
        let client = client_for(addr, Some("KEY"));

        assert!(client.get_transactions("0x1").await.is_empty());
        assert_eq!(client.get_balance("0x1").await, 0.0);
        assert_eq!(client.get_spot_price("usd").await, 0.0);
    }

    #[tokio::test]
    async fn test_unreachable_service_degrades() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(addr, Some("KEY"));
        assert!(client.get_transactions("0x1").await.is_empty());
        assert_eq!(client.get_balance("0x1").await, 0.0);
        assert_eq!(client.get_spot_price("eur").await, 0.0);
    }

    #[tokio::test]
    async fn test_empty_history_is_not_an_error() {
        let addr = serve(|_| {
            (
                200,
                r#"{"status":"0","message":"No transactions found","result":[]}"#.to_string(),
            )
        })
        .await;
        let explorer = ExplorerClient::new(reqwest::Client::new(), &client_config(addr));
        assert!(explorer.fetch_transactions("0x1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_reports_no_credential() {
        let addr = serve(healthy).await;
        let client = client_for(addr, None);
        assert!(!client.has_credential());
        assert!(client.get_transactions("0x1").await.is_empty());
    }

    fn client_config(addr: SocketAddr) -> crate::config::LedgerConfig {
        crate::config::LedgerConfig {
            api_url: format!("http://{}/api", addr),
            api_key: Some("KEY".to_string()),
            ..Default::default()
        }
    }
}
