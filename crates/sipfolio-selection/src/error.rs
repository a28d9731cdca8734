//! Error types for instrument selection.

use thiserror::Error;

/// Errors that can occur during selection.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// The universe holds no instruments at all.
    #[error("Instrument universe is empty")]
    EmptyUniverse,

    /// Every instrument failed the quality gate.
    #[error(
        "No instrument out of {universe_size} passed the quality gate (P/E > 0 and average historical growth > 0)"
    )]
    NoUsableInstruments {
        /// Number of instruments that were screened.
        universe_size: usize,
    },

    /// A selection parameter is outside its supported range.
    #[error("Invalid selection parameter: {0}")]
    InvalidParameter(String),
}

impl SelectionError {
    /// Whether the error is caused by insufficient instrument data rather than bad parameters.
    pub const fn is_data_insufficiency(&self) -> bool {
        matches!(self, Self::EmptyUniverse | Self::NoUsableInstruments { .. })
    }
}
