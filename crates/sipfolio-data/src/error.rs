//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while building or loading an instrument universe.
#[derive(Debug, Error)]
pub enum DataError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The same ticker appears more than once.
    #[error("Duplicate ticker in universe: {0}")]
    DuplicateTicker(String),

    /// Current price is missing, zero, negative or not finite.
    #[error("Invalid current price for {ticker}: {price}")]
    InvalidPrice {
        /// Ticker of the offending instrument.
        ticker: String,
        /// Price that was rejected.
        price: f64,
    },

    /// A required column is empty on a given record.
    #[error("Missing {field} on record {line}")]
    MissingField {
        /// 1-based record number (header excluded).
        line: usize,
        /// Column name.
        field: &'static str,
    },
}
