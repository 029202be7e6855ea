//! Transaction flow analysis
//!
//! Aggregates inflow, outflow and gas over an account's history, counts
//! counterparties and flags interactions with registry contracts. Failed
//! transactions (`is_error`) only count toward the raw total.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::dataset::{MaliciousRegistry, Severity};
use crate::ledger::Transaction;

/// Direction of value relative to the screened account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// One transaction touching a malicious-registry address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaliciousInteraction {
    pub tx_hash: String,
    pub counterparty: String,
    pub direction: Direction,
    pub contract_name: Option<String>,
    pub severity: Severity,
    pub jurisdictions: BTreeSet<String>,
    pub value_eth: f64,
}

/// Counterparty and how often it appeared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterpartyCount {
    pub address: String,
    pub count: usize,
}

/// Counterparty frequencies that remember first-seen order
#[derive(Debug, Clone, Default)]
pub struct CounterpartyTally {
    /// (address, count), in first-seen order
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl CounterpartyTally {
    pub fn record(&mut self, address: &str) {
        match self.index.get(address) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(address.to_string(), self.entries.len());
                self.entries.push((address.to_string(), 1));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest count; ties go to the counterparty seen first
    pub fn most_frequent(&self) -> Option<CounterpartyCount> {
        self.ranked(1).into_iter().next()
    }

    /// Descending by count, ties in first-seen order
    pub fn ranked(&self, limit: usize) -> Vec<CounterpartyCount> {
        let mut ranked: Vec<&(String, usize)> = self.entries.iter().collect();
        // stable sort keeps first-seen order among equal counts
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(limit)
            .map(|(address, count)| CounterpartyCount {
                address: address.clone(),
                count: *count,
            })
            .collect()
    }
}

/// Aggregates produced by [`TransactionAnalyzer::analyze`]
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    /// Every input transaction, failed ones included
    pub total_tx_count: usize,
    pub value_in: f64,
    pub value_out: f64,
    pub gas_paid: f64,
    pub malicious_interactions: Vec<MaliciousInteraction>,
    pub counterparty_frequency: CounterpartyTally,
}

impl AnalysisResult {
    pub fn most_frequent_counterparty(&self) -> Option<CounterpartyCount> {
        self.counterparty_frequency.most_frequent()
    }
}

/// Analyzes a transaction list against the malicious-contract registry
pub struct TransactionAnalyzer<'a> {
    registry: &'a MaliciousRegistry,
}

impl<'a> TransactionAnalyzer<'a> {
    pub fn new(registry: &'a MaliciousRegistry) -> Self {
        Self { registry }
    }

    pub fn analyze(&self, transactions: &[Transaction], address: &str) -> AnalysisResult {
        let wallet = address.to_lowercase();
        let mut result = AnalysisResult {
            total_tx_count: transactions.len(),
            ..Default::default()
        };

        for tx in transactions {
            if tx.is_error {
                continue;
            }

            let from = tx.from.to_lowercase();
            let to = tx.to.as_deref().map(str::to_lowercase);
            let value = tx.value_eth();

            // Flow and counterparty
            let (direction, counterparty) = if to.as_deref() == Some(wallet.as_str()) {
                result.value_in += value;
                (Some(Direction::In), Some(from.clone()))
            } else if from == wallet {
                result.value_out += value;
                (Some(Direction::Out), to.clone())
            } else {
                (None, None)
            };

            if from == wallet {
                result.gas_paid += tx.fee_eth();
            }

            let Some(counterparty) = counterparty.filter(|c| !c.is_empty()) else {
                continue;
            };
            result.counterparty_frequency.record(&counterparty);

            let listed = self.registry.get(&counterparty);
            if let (Some(direction), Some(contract)) = (direction, listed) {
                result.malicious_interactions.push(MaliciousInteraction {
                    tx_hash: tx.hash.clone(),
                    counterparty: counterparty.clone(),
                    direction,
                    contract_name: contract.name.clone(),
                    severity: contract.severity,
                    jurisdictions: contract.jurisdictions_blocked.clone(),
                    value_eth: value,
                });
            }
        }

        result
    }
}
