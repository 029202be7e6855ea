//! Ledger API wire types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Smallest units per native display unit (wei per ether)
pub const WEI_PER_ETH: f64 = 1e18;

/// One account transaction as returned by the ledger API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, deserialize_with = "text")]
    pub hash: String,
    #[serde(default, deserialize_with = "text")]
    pub from: String,
    /// `None` for contract creation
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub to: Option<String>,
    /// Integer string in smallest units
    #[serde(default = "zero_string", deserialize_with = "amount")]
    pub value: String,
    #[serde(default = "zero_string", deserialize_with = "amount")]
    pub gas_used: String,
    #[serde(default = "zero_string", deserialize_with = "amount")]
    pub gas_price: String,
    #[serde(default, deserialize_with = "flag")]
    pub is_error: bool,
}

impl Transaction {
    /// Transferred value in display units, 0.0 when malformed
    pub fn value_eth(&self) -> f64 {
        wei_to_eth(&self.value)
    }

    /// Fee paid in display units, 0.0 when malformed or overflowing
    pub fn fee_eth(&self) -> f64 {
        let used = parse_wei(&self.gas_used);
        let price = parse_wei(&self.gas_price);
        match (used, price) {
            (Some(used), Some(price)) => used
                .checked_mul(price)
                .map(|fee| fee as f64 / WEI_PER_ETH)
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

/// Convert an integer smallest-unit string to display units, 0.0 on bad input
pub fn wei_to_eth(raw: &str) -> f64 {
    parse_wei(raw)
        .map(|wei| wei as f64 / WEI_PER_ETH)
        .unwrap_or(0.0)
}

fn parse_wei(raw: &str) -> Option<u128> {
    raw.trim().parse::<u128>().ok()
}

/// Block-explorer response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

impl ExplorerResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "1"
    }
}

fn zero_string() -> String {
    "0".to_string()
}

/// Strings as-is, numbers rendered, anything else empty
fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Integer amounts arrive as strings or bare numbers; anything else is "0"
fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n
            .as_u64()
            .map(|v| v.to_string())
            .unwrap_or_else(|| n.to_string()),
        _ => zero_string(),
    })
}

fn empty_string_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw = text(d)?;
    Ok(Some(raw).filter(|s| !s.trim().is_empty()))
}

/// Accepts `"0"`/`"1"`, `0`/`1` and booleans
fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let raw = Value::deserialize(d)?;
    Ok(match raw {
        Value::Bool(b) => b,
        Value::String(s) => s.trim() == "1" || s.trim().eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_u64() == Some(1),
        _ => false,
    })
}
