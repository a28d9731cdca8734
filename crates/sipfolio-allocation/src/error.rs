//! Error types for allocation.

use thiserror::Error;

/// Errors that can occur while weighting or reconciling a portfolio.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// Nothing to allocate to.
    #[error("Cannot allocate an empty selection")]
    EmptySelection,

    /// Reconciliation divides by the unit price.
    #[error("Non-positive price for {ticker}: {price}")]
    NonPositivePrice {
        /// Ticker of the offending instrument.
        ticker: String,
        /// Rejected price.
        price: f64,
    },

    /// Vector lengths disagree.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Unrecognised weighting method name.
    #[error("Unknown optimization method: {0} (expected max_sharpe, equal_weight or risk_parity)")]
    UnknownMethod(String),
}
