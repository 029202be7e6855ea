//! Sanctions screening
//!
//! Address extraction strategies for the supported record layouts and the
//! matcher that runs an address against every loaded dataset.

pub mod extract;
pub mod matcher;

pub use extract::RecordShape;
pub use matcher::{SanctionSummary, SanctionsMatcher};
