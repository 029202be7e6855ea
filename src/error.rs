//! Error types for the screening engine

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the screening engine
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Ledger / price API errors
    #[error("API request failed: {0}")]
    Request(String),

    #[error("API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("API reported no data (status {status}): {message}")]
    NoData { status: String, message: String },

    #[error("API response decode failed: {0}")]
    Decode(String),

    #[error("Price for {asset}/{currency} missing from response")]
    PriceMissing { asset: String, currency: String },

    // Dataset errors
    #[error("Dataset {file} could not be read: {reason}")]
    DatasetIo { file: String, reason: String },

    #[error("Dataset {file} could not be parsed: {reason}")]
    DatasetParse { file: String, reason: String },
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Decode(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}
