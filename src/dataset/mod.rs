//! Sanctions datasets and the malicious-contract registry
//!
//! Everything here is loaded once when an engine is built and read-only
//! afterwards.

pub mod loader;
pub mod types;

pub use loader::{DatasetCatalog, DatasetLoader, DiagnosticKind, LoadDiagnostic};
pub use types::{Dataset, MaliciousContract, MaliciousRegistry, SanctionEntity, Severity};
