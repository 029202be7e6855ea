//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub price: PriceConfig,
    #[serde(default)]
    pub datasets: DatasetConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Block-explorer style ledger API
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_api_url")]
    pub api_url: String,
    /// API key; screening refuses to run without one
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Transaction list calls get a longer budget, responses can be large
    #[serde(default = "default_tx_timeout_ms")]
    pub tx_timeout_ms: u64,
}

/// Spot price API
#[derive(Debug, Clone, Deserialize)]
pub struct PriceConfig {
    #[serde(default = "default_price_api_url")]
    pub api_url: String,
    #[serde(default = "default_asset_id")]
    pub asset_id: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Dataset locations
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_malicious_registry_file")]
    pub malicious_registry_file: String,
    #[serde(default = "default_sanctions_core_file")]
    pub sanctions_core_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_top_counterparties")]
    pub top_counterparties: usize,
}

impl LedgerConfig {
    /// Configured API key, treating blank strings as absent
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn tx_timeout(&self) -> Duration {
        Duration::from_millis(self.tx_timeout_ms)
    }
}

impl PriceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl DatasetConfig {
    pub fn malicious_registry_path(&self) -> PathBuf {
        self.data_dir.join(&self.malicious_registry_file)
    }

    pub fn sanctions_core_path(&self) -> PathBuf {
        self.data_dir.join(&self.sanctions_core_file)
    }

    /// Filenames the auxiliary scan must skip
    pub fn core_files(&self) -> [&str; 2] {
        [
            self.malicious_registry_file.as_str(),
            self.sanctions_core_file.as_str(),
        ]
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            api_url: default_ledger_api_url(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            tx_timeout_ms: default_tx_timeout_ms(),
        }
    }
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            api_url: default_price_api_url(),
            asset_id: default_asset_id(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            malicious_registry_file: default_malicious_registry_file(),
            sanctions_core_file: default_sanctions_core_file(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_counterparties: default_top_counterparties(),
        }
    }
}

// Default value functions
fn default_ledger_api_url() -> String {
    "https://api.etherscan.io/api".to_string()
}

fn default_price_api_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_asset_id() -> String {
    "ethereum".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_tx_timeout_ms() -> u64 {
    15_000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_malicious_registry_file() -> String {
    "malicious_scs_2025.json".to_string()
}

fn default_sanctions_core_file() -> String {
    "entities.ftm.json".to_string()
}

fn default_top_counterparties() -> usize {
    10
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("ledger.api_url", default_ledger_api_url())?
            .set_default("ledger.timeout_ms", default_timeout_ms() as i64)?
            .set_default("ledger.tx_timeout_ms", default_tx_timeout_ms() as i64)?
            .set_default("price.api_url", default_price_api_url())?
            .set_default("price.asset_id", default_asset_id())?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix SCREENING__)
            .add_source(
                config::Environment::with_prefix("SCREENING")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.ledger.api_url.trim().is_empty() {
            anyhow::bail!("ledger.api_url must not be empty");
        }
        if self.price.api_url.trim().is_empty() {
            anyhow::bail!("price.api_url must not be empty");
        }
        if self.price.asset_id.trim().is_empty() {
            anyhow::bail!("price.asset_id must not be empty");
        }

        if self.ledger.timeout_ms == 0 || self.ledger.tx_timeout_ms == 0 {
            anyhow::bail!("ledger timeouts must be positive");
        }
        if self.price.timeout_ms == 0 {
            anyhow::bail!("price.timeout_ms must be positive");
        }

        if self.datasets.malicious_registry_file == self.datasets.sanctions_core_file {
            anyhow::bail!(
                "malicious_registry_file and sanctions_core_file must differ, both are {}",
                self.datasets.sanctions_core_file
            );
        }

        if self.ledger.api_key().is_none() {
            tracing::warn!("No ledger API key configured - every screening will be rejected");
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Ledger:
    api_url: {}
    api_key: {}
    timeout: {}ms (tx list {}ms)
  Price:
    api_url: {}
    asset: {}
    timeout: {}ms
  Datasets:
    data_dir: {}
    malicious_registry: {}
    sanctions_core: {}
  Report:
    top_counterparties: {}
"#,
            mask_url(&self.ledger.api_url),
            if self.ledger.api_key().is_none() {
                "(not set)"
            } else {
                "***"
            },
            self.ledger.timeout_ms,
            self.ledger.tx_timeout_ms,
            mask_url(&self.price.api_url),
            self.price.asset_id,
            self.price.timeout_ms,
            self.datasets.data_dir.display(),
            self.datasets.malicious_registry_file,
            self.datasets.sanctions_core_file,
            self.report.top_counterparties,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}
