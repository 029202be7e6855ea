//! Wallet Screening Library
//!
//! Screens blockchain accounts against sanctions datasets and a
//! malicious-contract registry, analyzes transaction flow, and produces a
//! structured risk report.

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod report;
pub mod sanctions;

// Re-export commonly used types
pub use config::Config;
pub use engine::{ScreeningEngine, ScreeningRejection};
pub use error::{Error, Result};
pub use report::ScreeningReport;
